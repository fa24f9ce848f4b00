use rockpress_core::CompressionKind;

/// Which codecs this process may use.
///
/// Built once at startup and then only read, so it can be shared freely.
/// [`CompressionKind::None`] is always available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    mask: u8,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::compiled()
    }
}

impl Capabilities {
    /// Pass-through only.
    pub fn none() -> Self {
        Self {
            mask: 1 << CompressionKind::None.id(),
        }
    }

    pub fn all() -> Self {
        CompressionKind::ALL
            .iter()
            .fold(Self::none(), |caps, kind| caps.with(*kind))
    }

    /// Codecs linked into this build, according to the crate features.
    pub fn compiled() -> Self {
        let mut caps = Self::none();
        if cfg!(feature = "snappy") {
            caps = caps.with(CompressionKind::Snappy);
        }
        if cfg!(feature = "zlib") {
            caps = caps.with(CompressionKind::Zlib);
        }
        if cfg!(feature = "bzip2") {
            caps = caps.with(CompressionKind::BZip2);
        }
        if cfg!(feature = "lz4") {
            caps = caps.with(CompressionKind::Lz4).with(CompressionKind::Lz4Hc);
        }
        caps
    }

    pub fn with(self, kind: CompressionKind) -> Self {
        Self {
            mask: self.mask | 1 << kind.id(),
        }
    }

    /// Disable `kind`. Pass-through cannot be disabled.
    pub fn without(self, kind: CompressionKind) -> Self {
        if kind == CompressionKind::None {
            return self;
        }
        Self {
            mask: self.mask & !(1 << kind.id()),
        }
    }

    pub fn supports(self, kind: CompressionKind) -> bool {
        self.mask & (1 << kind.id()) != 0
    }

    pub fn kinds(self) -> impl Iterator<Item = CompressionKind> {
        CompressionKind::ALL
            .into_iter()
            .filter(move |kind| self.supports(*kind))
    }
}
