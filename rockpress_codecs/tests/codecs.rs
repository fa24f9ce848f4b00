/// Integration tests: every adapter behind the dispatcher, driven the way the
/// storage engine drives them (one independent block per call).
#[cfg(feature = "snappy")]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[cfg(feature = "bzip2")]
use rockpress_codecs::Bzip2Codec;
#[cfg(feature = "lz4")]
use rockpress_codecs::Lz4Codec;
#[cfg(feature = "snappy")]
use rockpress_codecs::SnappyCodec;
#[cfg(feature = "zlib")]
use rockpress_codecs::ZlibCodec;
use rockpress_codecs::{Capabilities, CodecDispatcher};
#[cfg(all(feature = "zlib", feature = "bzip2"))]
use rockpress_core::buffer::GrowthPolicy;
use rockpress_core::{Codec, CodecError, CompressionKind, CompressionOptions};
#[cfg(feature = "lz4")]
use rockpress_core::FRAME_PREFIX_LEN;

/// Generate `len` deterministic bytes using a simple LCG.
fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (rng >> 56) as u8
        })
        .collect()
}

/// Generate `len` highly compressible bytes (repeating pattern).
fn compressible_bytes(len: usize) -> Vec<u8> {
    let pattern = b"the quick brown fox jumps over the lazy dog. ";
    (0..len).map(|i| pattern[i % pattern.len()]).collect()
}

const COMPRESSING_KINDS: [CompressionKind; 5] = [
    CompressionKind::Snappy,
    CompressionKind::Zlib,
    CompressionKind::BZip2,
    CompressionKind::Lz4,
    CompressionKind::Lz4Hc,
];

// ── helpers ───────────────────────────────────────────────────────────────

/// Wraps a real codec and counts how often the dispatcher reaches it.
#[cfg(feature = "snappy")]
struct CountingCodec {
    inner: Arc<dyn Codec>,
    calls: AtomicUsize,
}

#[cfg(feature = "snappy")]
impl CountingCodec {
    fn new(inner: Arc<dyn Codec>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(feature = "snappy")]
impl Codec for CountingCodec {
    fn kind(&self) -> CompressionKind {
        self.inner.kind()
    }

    fn compress(&self, opts: &CompressionOptions, raw: &[u8]) -> rockpress_core::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.compress(opts, raw)
    }

    fn decompress(&self, opts: &CompressionOptions, compressed: &[u8]) -> rockpress_core::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.decompress(opts, compressed)
    }
}

/// Always fails on the write path, as an engine with a bad context would.
struct BrokenCodec;

impl Codec for BrokenCodec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Zlib
    }

    fn compress(&self, _opts: &CompressionOptions, _raw: &[u8]) -> rockpress_core::Result<Vec<u8>> {
        Err(CodecError::init(CompressionKind::Zlib, "context allocation failed"))
    }

    fn decompress(&self, _opts: &CompressionOptions, _compressed: &[u8]) -> rockpress_core::Result<Vec<u8>> {
        Err(CodecError::stream(CompressionKind::Zlib, "unreachable in these tests"))
    }
}

/// Compressing kinds this build was compiled with.
fn compiled_kinds() -> Vec<CompressionKind> {
    COMPRESSING_KINDS
        .into_iter()
        .filter(|kind| Capabilities::compiled().supports(*kind))
        .collect()
}

fn roundtrip(dispatcher: &CodecDispatcher, kind: CompressionKind, data: &[u8]) -> Vec<u8> {
    let opts = CompressionOptions::default();
    let compressed = dispatcher.compress(kind, &opts, data).unwrap();
    dispatcher.decompress_with(kind, &opts, &compressed).unwrap()
}

// ── round trips ────────────────────────────────────────────────────────────

#[test]
fn test_roundtrip_every_kind_and_shape() {
    let dispatcher = CodecDispatcher::new();
    let shapes: Vec<Vec<u8>> = vec![
        Vec::new(),
        vec![0x42],
        b"hello, block".to_vec(),
        compressible_bytes(64 * 1024 + 17),
        pseudo_random_bytes(64 * 1024 + 3, 7),
    ];

    for kind in std::iter::once(CompressionKind::None).chain(compiled_kinds()) {
        for data in &shapes {
            assert_eq!(
                roundtrip(&dispatcher, kind, data),
                *data,
                "{kind} round trip failed for {} bytes",
                data.len()
            );
        }
    }
}

#[test]
#[cfg(feature = "zlib")]
fn test_zlib_empty_block() {
    let dispatcher = CodecDispatcher::new();
    let compressed = dispatcher
        .compress(CompressionKind::Zlib, &CompressionOptions::default(), b"")
        .unwrap();
    assert!(!compressed.is_empty(), "even an empty deflate stream has an end marker");
    assert_eq!(dispatcher.decompress(CompressionKind::Zlib, &compressed).unwrap(), b"");
}

#[test]
#[cfg(feature = "lz4")]
fn test_lz4_repetitive_block_is_framed_and_smaller() {
    let dispatcher = CodecDispatcher::new();
    let data = vec![b'a'; 10_000];
    let compressed = dispatcher
        .compress(CompressionKind::Lz4, &CompressionOptions::default(), &data)
        .unwrap();

    assert!(compressed.len() < data.len());
    assert_eq!(compressed[..FRAME_PREFIX_LEN], 10_000u64.to_ne_bytes());
    assert_eq!(
        dispatcher.uncompressed_len(CompressionKind::Lz4, &compressed).unwrap(),
        Some(10_000)
    );
    assert_eq!(dispatcher.decompress(CompressionKind::Lz4, &compressed).unwrap(), data);
}

#[test]
#[cfg(feature = "bzip2")]
fn test_bzip2_incompressible_megabyte() {
    let dispatcher = CodecDispatcher::new();
    let data = pseudo_random_bytes(1_000_000, 42);
    let compressed = dispatcher
        .compress(CompressionKind::BZip2, &CompressionOptions::default(), &data)
        .unwrap();
    // Compression starts with room for exactly the input, so a payload
    // larger than the input means the buffer had to grow.
    assert!(
        compressed.len() > data.len(),
        "random data should expand: {} -> {}",
        data.len(),
        compressed.len()
    );
    assert_eq!(dispatcher.decompress(CompressionKind::BZip2, &compressed).unwrap(), data);
}

#[test]
#[cfg(feature = "zlib")]
fn test_zlib_output_grows_past_initial_guess() {
    // Compressible input decompresses to far more than five times its payload.
    let dispatcher = CodecDispatcher::new();
    let data = vec![0u8; 256 * 1024];
    let compressed = dispatcher
        .compress(CompressionKind::Zlib, &CompressionOptions::default(), &data)
        .unwrap();
    assert!(compressed.len() * 5 < data.len());
    assert_eq!(dispatcher.decompress(CompressionKind::Zlib, &compressed).unwrap(), data);
}

#[test]
#[cfg(feature = "lz4")]
fn test_lz4hc_honours_level_and_matches_lz4_decoder() {
    let data = compressible_bytes(32 * 1024);
    let dispatcher = CodecDispatcher::new();
    for level in [-1, 1, 9, 12, 40] {
        let opts = CompressionOptions::default().with_level(level);
        let compressed = dispatcher.compress(CompressionKind::Lz4Hc, &opts, &data).unwrap();
        // Same frame, same decoder.
        assert_eq!(Lz4Codec.decompress(&opts, &compressed).unwrap(), data);
    }
}

// ── framing and integrity ─────────────────────────────────────────────────

#[test]
#[cfg(feature = "lz4")]
fn test_lz4_shorter_than_prefix_fails() {
    let dispatcher = CodecDispatcher::new();
    let compressed = dispatcher
        .compress(CompressionKind::Lz4, &CompressionOptions::default(), b"hello world")
        .unwrap();

    let err = dispatcher
        .decompress(CompressionKind::Lz4, &compressed[..4])
        .unwrap_err();
    assert!(
        matches!(err, CodecError::StreamError { .. } | CodecError::TruncatedOutput { .. }),
        "unexpected error: {err}"
    );
}

#[test]
#[cfg(feature = "lz4")]
fn test_lz4_truncated_payload_never_yields_a_full_block() {
    let dispatcher = CodecDispatcher::new();
    let data = pseudo_random_bytes(4096, 3);
    let compressed = dispatcher
        .compress(CompressionKind::Lz4, &CompressionOptions::default(), &data)
        .unwrap();

    match dispatcher.decompress(CompressionKind::Lz4, &compressed[..compressed.len() - 100]) {
        Ok(out) => panic!("truncated payload decoded to {} bytes", out.len()),
        Err(CodecError::TruncatedOutput { partial, expected, .. }) => {
            assert_eq!(expected, data.len());
            assert!(partial.len() < data.len());
            assert_eq!(partial[..], data[..partial.len()]);
        }
        Err(err) => assert!(err.is_fatal_on_read()),
    }
}

#[test]
fn test_unframed_truncation_is_a_stream_error() {
    let dispatcher = CodecDispatcher::new();
    let data = compressible_bytes(100_000);
    let unframed = [CompressionKind::Zlib, CompressionKind::BZip2, CompressionKind::Snappy];
    for kind in compiled_kinds().into_iter().filter(|k| unframed.contains(k)) {
        let compressed = dispatcher
            .compress(kind, &CompressionOptions::default(), &data)
            .unwrap();
        let err = dispatcher
            .decompress(kind, &compressed[..compressed.len() / 2])
            .unwrap_err();
        assert!(matches!(err, CodecError::StreamError { .. }), "{kind}: {err}");
        assert!(err.is_fatal_on_read());
        assert_eq!(err.kind(), kind);
    }
}

#[test]
fn test_garbage_is_rejected() {
    let dispatcher = CodecDispatcher::new();
    let garbage = pseudo_random_bytes(512, 99);
    // Both formats start with a header that random bytes fail to match.
    let with_header = CompressionOptions::default().with_window_bits(15);
    let headed = [CompressionKind::Zlib, CompressionKind::BZip2];
    for kind in compiled_kinds().into_iter().filter(|k| headed.contains(k)) {
        let err = dispatcher.decompress_with(kind, &with_header, &garbage).unwrap_err();
        assert!(matches!(err, CodecError::StreamError { .. }), "{kind}: {err}");
    }
}

#[test]
#[cfg(all(feature = "snappy", feature = "zlib"))]
fn test_uncompressed_len_probe() {
    let dispatcher = CodecDispatcher::new();
    let data = compressible_bytes(5000);
    let opts = CompressionOptions::default();

    let snappy = dispatcher.compress(CompressionKind::Snappy, &opts, &data).unwrap();
    assert_eq!(
        dispatcher.uncompressed_len(CompressionKind::Snappy, &snappy).unwrap(),
        Some(5000)
    );

    let zlib = dispatcher.compress(CompressionKind::Zlib, &opts, &data).unwrap();
    assert_eq!(dispatcher.uncompressed_len(CompressionKind::Zlib, &zlib).unwrap(), None);

    assert_eq!(
        dispatcher.uncompressed_len(CompressionKind::None, &data).unwrap(),
        Some(5000)
    );
}

// ── zlib options ──────────────────────────────────────────────────────────

#[test]
#[cfg(feature = "zlib")]
fn test_zlib_window_bits_select_framing() {
    let codec = ZlibCodec::default();
    let data = compressible_bytes(20_000);

    let gzip = CompressionOptions::default().with_window_bits(31);
    let compressed = codec.compress(&gzip, &data).unwrap();
    assert_eq!(compressed[..2], [0x1f, 0x8b]);
    // Any positive window_bits detects the header on read.
    assert_eq!(
        codec
            .decompress(&CompressionOptions::default().with_window_bits(15), &compressed)
            .unwrap(),
        data
    );

    let zlib = CompressionOptions::default().with_window_bits(15);
    let compressed = codec.compress(&zlib, &data).unwrap();
    assert_eq!(compressed[0] & 0x0f, 8, "zlib header announces deflate");
    assert_eq!(codec.decompress(&gzip, &compressed).unwrap(), data);

    // Raw deflate cannot be read as zlib.
    let raw = codec.compress(&CompressionOptions::default(), &data).unwrap();
    assert!(codec.decompress(&zlib, &raw).is_err());
}

#[test]
#[cfg(feature = "zlib")]
fn test_zlib_rejects_bad_options_at_init() {
    let codec = ZlibCodec::default();
    let cases = [
        CompressionOptions::new(12, -14, 0),
        CompressionOptions::new(-1, 3, 0),
        CompressionOptions::new(-1, -14, 9),
    ];
    for opts in cases {
        let err = codec.compress(&opts, b"block").unwrap_err();
        assert!(matches!(err, CodecError::InitFailure { .. }), "{opts:?}: {err}");
    }
}

#[test]
#[cfg(feature = "zlib")]
fn test_zlib_nondefault_strategy_still_roundtrips() {
    let codec = ZlibCodec::default();
    let data = compressible_bytes(10_000);
    let opts = CompressionOptions::new(6, -14, 2);
    let compressed = codec.compress(&opts, &data).unwrap();
    assert_eq!(codec.decompress(&opts, &compressed).unwrap(), data);
}

#[test]
#[cfg(all(feature = "zlib", feature = "bzip2"))]
fn test_growth_limit_surfaces_as_stream_error() {
    let tight = GrowthPolicy {
        max_steps: 2,
        ..GrowthPolicy::default()
    };
    let data = vec![7u8; 1 << 20];
    let compressed = ZlibCodec::default()
        .compress(&CompressionOptions::default(), &data)
        .unwrap();

    let err = ZlibCodec::with_policy(tight)
        .decompress(&CompressionOptions::default(), &compressed)
        .unwrap_err();
    assert!(matches!(err, CodecError::StreamError { .. }), "{err}");

    let compressed = Bzip2Codec::default()
        .compress(&CompressionOptions::default(), &data)
        .unwrap();
    let err = Bzip2Codec::with_policy(tight)
        .decompress(&CompressionOptions::default(), &compressed)
        .unwrap_err();
    assert!(matches!(err, CodecError::StreamError { .. }), "{err}");
}

// ── dispatcher ────────────────────────────────────────────────────────────

#[test]
#[cfg(feature = "snappy")]
fn test_unsupported_kind_never_reaches_adapter() {
    let counting = CountingCodec::new(Arc::new(SnappyCodec));
    let dispatcher =
        CodecDispatcher::with_capabilities(Capabilities::all().without(CompressionKind::Snappy))
            .register(counting.clone());

    assert!(!dispatcher.supports(CompressionKind::Snappy));
    let err = dispatcher
        .compress(CompressionKind::Snappy, &CompressionOptions::default(), b"block")
        .unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(err.kind(), CompressionKind::Snappy);

    let err = dispatcher.decompress(CompressionKind::Snappy, b"block").unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(counting.calls(), 0);
}

#[test]
#[cfg(feature = "snappy")]
fn test_registered_adapter_is_used_when_supported() {
    let counting = CountingCodec::new(Arc::new(SnappyCodec));
    let dispatcher = CodecDispatcher::with_capabilities(Capabilities::all()).register(counting.clone());

    let data = compressible_bytes(1000);
    assert_eq!(roundtrip(&dispatcher, CompressionKind::Snappy, &data), data);
    assert_eq!(counting.calls(), 2);
}

#[test]
fn test_none_always_passes_through() {
    let dispatcher = CodecDispatcher::with_capabilities(Capabilities::none());
    let data = pseudo_random_bytes(300, 1);
    let opts = CompressionOptions::default();

    assert_eq!(dispatcher.compress(CompressionKind::None, &opts, &data).unwrap(), data);
    assert_eq!(dispatcher.decompress(CompressionKind::None, &data).unwrap(), data);
    for kind in COMPRESSING_KINDS {
        assert!(dispatcher.compress(kind, &opts, &data).unwrap_err().is_unsupported());
    }
}

#[test]
fn test_compress_or_store_falls_back_to_none() {
    let data = compressible_bytes(4096);
    let opts = CompressionOptions::default();

    let dispatcher = CodecDispatcher::with_capabilities(Capabilities::none());
    assert_eq!(
        dispatcher.compress_or_store(CompressionKind::Lz4, &opts, &data),
        (CompressionKind::None, data.clone())
    );

    let dispatcher = CodecDispatcher::new().register(Arc::new(BrokenCodec));
    assert_eq!(
        dispatcher.compress_or_store(CompressionKind::Zlib, &opts, &data),
        (CompressionKind::None, data)
    );
}

#[test]
#[cfg(feature = "lz4")]
fn test_compress_or_store_keeps_kind_on_success() {
    let dispatcher = CodecDispatcher::new();
    let data = compressible_bytes(4096);
    let (kind, payload) =
        dispatcher.compress_or_store(CompressionKind::Lz4, &CompressionOptions::default(), &data);
    assert_eq!(kind, CompressionKind::Lz4);
    assert!(payload.len() < data.len());
    assert_eq!(dispatcher.decompress(kind, &payload).unwrap(), data);
}

#[test]
#[cfg(feature = "zlib")]
fn test_decompress_exact_checks_recorded_length() {
    let dispatcher = CodecDispatcher::new();
    let data = compressible_bytes(2048);
    let opts = CompressionOptions::default();
    let compressed = dispatcher.compress(CompressionKind::Zlib, &opts, &data).unwrap();

    assert_eq!(
        dispatcher
            .decompress_exact(CompressionKind::Zlib, &opts, &compressed, data.len())
            .unwrap(),
        data
    );
    let err = dispatcher
        .decompress_exact(CompressionKind::Zlib, &opts, &compressed, data.len() + 1)
        .unwrap_err();
    assert!(matches!(err, CodecError::StreamError { .. }), "{err}");
}

#[test]
fn test_dispatcher_is_shared_across_threads() {
    let dispatcher = Arc::new(CodecDispatcher::new());
    let handles: Vec<_> = compiled_kinds()
        .into_iter()
        .enumerate()
        .map(|(i, kind)| {
            let dispatcher = Arc::clone(&dispatcher);
            std::thread::spawn(move || {
                let data = pseudo_random_bytes(20_000, i as u64);
                assert_eq!(roundtrip(&dispatcher, kind, &data), data);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

// ── builds without a codec ────────────────────────────────────────────────

#[test]
fn test_codecs_missing_from_build_are_unsupported() {
    let dispatcher = CodecDispatcher::new();
    let opts = CompressionOptions::default();
    for kind in COMPRESSING_KINDS {
        let compiled = Capabilities::compiled().supports(kind);
        assert_eq!(dispatcher.supports(kind), compiled, "{kind}");
        if !compiled {
            assert!(dispatcher.compress(kind, &opts, b"block").unwrap_err().is_unsupported());
            assert!(dispatcher.decompress(kind, b"block").unwrap_err().is_unsupported());
            assert_eq!(
                dispatcher.compress_or_store(kind, &opts, b"block"),
                (CompressionKind::None, b"block".to_vec())
            );
        }
    }
}

#[test]
#[cfg(not(feature = "snappy"))]
fn test_snappy_build_off_is_unsupported() {
    let dispatcher = CodecDispatcher::new();
    assert!(rockpress_codecs::codec_for(CompressionKind::Snappy).is_none());
    let err = dispatcher
        .compress(CompressionKind::Snappy, &CompressionOptions::default(), b"block")
        .unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(err.kind(), CompressionKind::Snappy);
}

#[test]
#[cfg(not(feature = "lz4"))]
fn test_lz4_build_off_is_unsupported() {
    let dispatcher = CodecDispatcher::new();
    for kind in [CompressionKind::Lz4, CompressionKind::Lz4Hc] {
        assert!(rockpress_codecs::codec_for(kind).is_none());
        let err = dispatcher.decompress(kind, b"framed?").unwrap_err();
        assert!(err.is_unsupported(), "{kind}: {err}");
    }
}
