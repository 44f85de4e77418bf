//! 分片下载端到端测试（内存传输 + 内存存储）。
//!
//! 覆盖：正常分片边界、探测失败、分片拉取重试与耗尽、响应起点校验、写入重试与耗尽、
//! 响应流中断、最终大小不一致、请求模板复用、会话复用、在 tokio 任务中运行。

use std::time::Duration;

use reqwest::header::{HeaderValue, RANGE};
use reqwest::{Method, StatusCode};

use crate::tests::{
    ContentRangeMode, Failure, MemoryStorage, MockTransport, init_tracing, random_payload,
};
use crate::{RemoteTransfer, TransferConfig, TransferError, TransferErrorKind, TransferStatus};

fn config(chunk_size: u64, max_retries: u32) -> TransferConfig {
    TransferConfig::new("http://example.test/data.bin", "downloads/data.bin")
        .unwrap()
        .chunk_size(chunk_size)
        .retry_timeout(Duration::ZERO)
        .max_retries(max_retries)
}

fn transfer(
    config: TransferConfig,
    transport: &MockTransport,
    storage: &MemoryStorage,
) -> RemoteTransfer {
    RemoteTransfer::new(config)
        .unwrap()
        .with_transport(transport.clone())
        .with_storage(storage.clone())
}

// ═══════════════════════════ 正常路径 ═══════════════════════════

#[tokio::test]
async fn downloads_25_bytes_in_three_chunks() {
    init_tracing();
    let payload = random_payload(25);
    let transport = MockTransport::new(payload.clone());
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 3), &transport, &storage);

    assert!(t.download().await.unwrap());

    assert_eq!(
        transport.range_headers(),
        vec!["bytes=0-0", "bytes=0-9", "bytes=10-19", "bytes=20-24"]
    );
    assert_eq!(storage.data(), payload.to_vec());
    assert_eq!(t.total_size(), 25);
    assert_eq!(t.downloaded_size(), 25);
    assert_eq!(t.get_progress(), 100.0);
    assert_eq!(t.status(), TransferStatus::Completed);
    assert!(storage.state.lock().unwrap().finished);
}

#[tokio::test]
async fn single_chunk_when_chunk_size_exceeds_total() {
    init_tracing();
    let payload = random_payload(100);
    let transport = MockTransport::new(payload.clone()).buffer_size(7);
    let storage = MemoryStorage::new();
    let mut t = transfer(config(1024, 3), &transport, &storage);

    assert!(t.download().await.unwrap());
    assert_eq!(transport.range_headers(), vec!["bytes=0-0", "bytes=0-99"]);
    assert_eq!(storage.data(), payload.to_vec());
    // 100 字节按 7 字节一块写入
    assert_eq!(storage.append_calls(), 15);
}

#[tokio::test]
async fn progress_callback_only_fires_after_a_second() {
    init_tracing();
    let transport = MockTransport::new(random_payload(40));
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 3), &transport, &storage);

    let mut calls = 0u32;
    t.download_with_progress(|_pct: f64, _speed: f64| calls += 1)
        .await
        .unwrap();

    // 内存传输远小于一秒，节流后不会回调
    assert_eq!(calls, 0);
}

// ═══════════════════════════ 探测 ═══════════════════════════

#[tokio::test]
async fn missing_content_range_fails_without_chunk_requests() {
    init_tracing();
    let transport = MockTransport::new(random_payload(25)).content_range(ContentRangeMode::Missing);
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 3), &transport, &storage);

    let err = t.download().await.unwrap_err();
    assert_eq!(err.kind(), TransferErrorKind::SizeUnknown);
    assert_eq!(transport.range_headers(), vec!["bytes=0-0"]);
    assert!(storage.data().is_empty());
}

#[tokio::test]
async fn unparsable_or_zero_total_is_size_unknown() {
    init_tracing();
    for raw in ["bytes 0-0/*", "bytes 0-0/abc", "bytes 0-0/0"] {
        let transport = MockTransport::new(random_payload(25)).content_range(ContentRangeMode::Raw(raw));
        let storage = MemoryStorage::new();
        let mut t = transfer(config(10, 3), &transport, &storage);

        let err = t.download().await.unwrap_err();
        assert!(
            matches!(err, TransferError::SizeUnknown { .. }),
            "{raw}: {err}"
        );
        assert_eq!(transport.requests().len(), 1);
    }
}

#[tokio::test]
async fn empty_resource_is_size_unknown() {
    init_tracing();
    let transport = MockTransport::new(bytes::Bytes::new());
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 3), &transport, &storage);

    let err = t.download().await.unwrap_err();
    assert_eq!(err.kind(), TransferErrorKind::SizeUnknown);
    assert_eq!(t.total_size(), 0);
    assert_eq!(t.get_progress(), 0.0);
}

/// 探测请求不重试：一次传输错误就是 `SizeUnknown`，
/// 而分片拉取同样的错误会重试到 `max_retries`。两者不一致是有意保留的行为。
#[tokio::test]
async fn probe_is_not_retried_unlike_chunk_fetches() {
    init_tracing();
    let transport = MockTransport::new(random_payload(25)).probe_error();
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 5), &transport, &storage);

    let err = t.download().await.unwrap_err();
    assert_eq!(err.kind(), TransferErrorKind::SizeUnknown);
    assert_eq!(transport.requests().len(), 1);

    let transport = MockTransport::new(random_payload(25)).fail_chunk(10, 1, Failure::Request);
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 5), &transport, &storage);
    assert!(t.download().await.unwrap());
}

// ═══════════════════════════ 分片拉取 ═══════════════════════════

#[tokio::test]
async fn third_chunk_failing_every_attempt_is_chunk_fetch_error() {
    init_tracing();
    let payload = random_payload(25);
    let transport = MockTransport::new(payload.clone()).fail_chunk(
        20,
        u32::MAX,
        Failure::Status(StatusCode::SERVICE_UNAVAILABLE),
    );
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 3), &transport, &storage);

    let err = t.download().await.unwrap_err();
    match &err {
        TransferError::ChunkFetch { range, attempts, .. } => {
            assert_eq!((range.start, range.end), (20, 24));
            assert_eq!(*attempts, 3);
        }
        other => panic!("预期 ChunkFetch，得到 {other:?}"),
    }

    let third_chunk_requests = transport
        .range_headers()
        .iter()
        .filter(|h| *h == "bytes=20-24")
        .count();
    assert_eq!(third_chunk_requests, 3);
    assert_eq!(t.downloaded_size(), 20);
    assert_eq!(storage.data(), payload[..20].to_vec());
    assert_eq!(t.status(), TransferStatus::Failed(TransferErrorKind::ChunkFetch));
}

#[tokio::test]
async fn transient_fetch_failures_are_retried() {
    init_tracing();
    let payload = random_payload(30);
    let transport = MockTransport::new(payload.clone())
        .fail_chunk(0, 1, Failure::Request)
        .fail_chunk(10, 2, Failure::Status(StatusCode::BAD_GATEWAY))
        .fail_chunk(20, 2, Failure::NoBody);
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 3), &transport, &storage);

    assert!(t.download().await.unwrap());
    assert_eq!(storage.data(), payload.to_vec());
    // 探测 1 + 分片 (2 + 3 + 3)
    assert_eq!(transport.requests().len(), 9);
}

#[tokio::test]
async fn empty_body_counts_as_failed_attempt() {
    init_tracing();
    let transport = MockTransport::new(random_payload(25)).fail_chunk(10, u32::MAX, Failure::EmptyBody);
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 4), &transport, &storage);

    let err = t.download().await.unwrap_err();
    match err {
        TransferError::ChunkFetch { attempts, .. } => assert_eq!(attempts, 4),
        other => panic!("预期 ChunkFetch，得到 {other:?}"),
    }
    assert_eq!(t.downloaded_size(), 10);
}

#[tokio::test(start_paused = true)]
async fn fetch_retries_wait_retry_timeout_between_attempts() {
    init_tracing();
    let transport = MockTransport::new(random_payload(20)).fail_chunk(
        10,
        u32::MAX,
        Failure::Status(StatusCode::INTERNAL_SERVER_ERROR),
    );
    let storage = MemoryStorage::new();
    let config = config(10, 4).retry_timeout(Duration::from_millis(5000));
    let mut t = transfer(config, &transport, &storage);

    let started = tokio::time::Instant::now();
    let err = t.download().await.unwrap_err();
    assert_eq!(err.kind(), TransferErrorKind::ChunkFetch);
    // 4 次尝试之间 3 次等待，最后一次失败后不再等待
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(15_000), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(20_000), "{elapsed:?}");
}

#[tokio::test]
async fn broken_stream_aborts_without_retry() {
    init_tracing();
    let payload = random_payload(25);
    let transport = MockTransport::new(payload.clone())
        .buffer_size(4)
        .fail_chunk(10, 1, Failure::BrokenStream);
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 5), &transport, &storage);

    let err = t.download().await.unwrap_err();
    assert_eq!(err.kind(), TransferErrorKind::StreamRead);
    // 探测 + 第一片 + 第二片各一次，流错误不重试
    assert_eq!(transport.requests().len(), 3);
    // 第二片在出错前写入了第一块
    assert_eq!(t.downloaded_size(), 14);
    assert_eq!(storage.data(), payload[..14].to_vec());
}

/// 服务器忽略 Range、每次都返回 200 + 完整内容：第一片从 0 开始，截取后内容正确；
/// 之后的分片起点对不上，按拉取失败重试直到耗尽，不会把错位的数据写进文件。
#[tokio::test]
async fn server_ignoring_range_fails_instead_of_corrupting() {
    init_tracing();
    let payload = random_payload(25);
    let transport = MockTransport::new(payload.clone()).ignore_range();
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 3), &transport, &storage);

    let err = t.download().await.unwrap_err();
    match &err {
        TransferError::ChunkFetch { range, attempts, .. } => {
            assert_eq!((range.start, range.end), (10, 19));
            assert_eq!(*attempts, 3);
        }
        other => panic!("预期 ChunkFetch，得到 {other:?}"),
    }
    assert_eq!(t.downloaded_size(), 10);
    assert_eq!(storage.data(), payload[..10].to_vec());
}

#[tokio::test]
async fn whole_body_is_accepted_for_single_chunk_from_zero() {
    init_tracing();
    let payload = random_payload(25);
    let transport = MockTransport::new(payload.clone()).ignore_range();
    let storage = MemoryStorage::new();
    let mut t = transfer(config(100, 3), &transport, &storage);

    assert!(t.download().await.unwrap());
    assert_eq!(storage.data(), payload.to_vec());
}

#[tokio::test]
async fn partial_response_at_wrong_offset_is_retried() {
    init_tracing();
    let payload = random_payload(25);
    let transport = MockTransport::new(payload.clone()).fail_chunk(10, 2, Failure::WrongOffset);
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 3), &transport, &storage);

    assert!(t.download().await.unwrap());
    assert_eq!(storage.data(), payload.to_vec());
    // 探测 1 + 分片 (1 + 3 + 1)
    assert_eq!(transport.requests().len(), 6);
}

#[tokio::test]
async fn partial_response_at_wrong_offset_never_written() {
    init_tracing();
    let payload = random_payload(25);
    let transport =
        MockTransport::new(payload.clone()).fail_chunk(20, u32::MAX, Failure::WrongOffset);
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 2), &transport, &storage);

    let err = t.download().await.unwrap_err();
    assert_eq!(err.kind(), TransferErrorKind::ChunkFetch);
    assert_eq!(storage.data(), payload[..20].to_vec());
}

fn assert_send<T: Send>(_: &T) {}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn download_can_be_spawned() {
    init_tracing();
    let payload = random_payload(25);
    let transport = MockTransport::new(payload.clone());
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 3), &transport, &storage);

    {
        let download = t.download();
        assert_send(&download);
    }
    {
        let download = t.download_with_progress(|_: f64, _: f64| {});
        assert_send(&download);
    }

    let handle = tokio::spawn(async move { t.download().await });
    assert!(handle.await.unwrap().unwrap());
    assert_eq!(storage.data(), payload.to_vec());
}

// ═══════════════════════════ 写入 ═══════════════════════════

#[tokio::test]
async fn transient_write_failures_are_retried_independently() {
    init_tracing();
    let payload = random_payload(25);
    let transport = MockTransport::new(payload.clone()).buffer_size(10);
    // 写入连续失败 2 次，预算 3 次
    let storage = MemoryStorage::new().failing_writes(2);
    let mut t = transfer(config(10, 3), &transport, &storage);

    assert!(t.download().await.unwrap());
    assert_eq!(storage.data(), payload.to_vec());
    // 写入重试不重新拉取分片
    assert_eq!(transport.requests().len(), 4);
    assert_eq!(storage.append_calls(), 5);
}

#[tokio::test]
async fn write_failures_exhausting_budget_is_chunk_write_error() {
    init_tracing();
    let payload = random_payload(25);
    let transport = MockTransport::new(payload).buffer_size(5);
    let storage = MemoryStorage::new().failing_writes(3);
    let mut t = transfer(config(10, 3), &transport, &storage);

    let err = t.download().await.unwrap_err();
    match &err {
        TransferError::ChunkWrite {
            offset, attempts, ..
        } => {
            assert_eq!(*offset, 0);
            assert_eq!(*attempts, 3);
        }
        other => panic!("预期 ChunkWrite，得到 {other:?}"),
    }
    assert_eq!(t.downloaded_size(), 0);
    assert_eq!(storage.append_calls(), 3);
    assert_eq!(transport.requests().len(), 2);
}

// ═══════════════════════════ 校验 ═══════════════════════════

#[tokio::test]
async fn truncated_destination_is_size_mismatch() {
    init_tracing();
    let transport = MockTransport::new(random_payload(25));
    let storage = MemoryStorage::new().truncated_by(1);
    let mut t = transfer(config(10, 3), &transport, &storage);

    let err = t.download().await.unwrap_err();
    match err {
        TransferError::SizeMismatch { expected, actual } => {
            assert_eq!(expected, 25);
            assert_eq!(actual, Some(24));
        }
        other => panic!("预期 SizeMismatch，得到 {other:?}"),
    }
    // 文件不清理
    assert_eq!(storage.data().len(), 25);
    assert_eq!(t.status(), TransferStatus::Failed(TransferErrorKind::SizeMismatch));
}

// ═══════════════════════════ 配置与模板 ═══════════════════════════

#[tokio::test]
async fn empty_destination_fails_before_any_request() {
    init_tracing();
    let transport = MockTransport::new(random_payload(25));
    let storage = MemoryStorage::new();
    let config = TransferConfig::new("http://example.test/data.bin", "").unwrap();
    let mut t = transfer(config, &transport, &storage);

    let err = t.download().await.unwrap_err();
    assert!(matches!(err, TransferError::DestinationPathMissing));
    assert!(transport.requests().is_empty());
    assert!(!storage.state.lock().unwrap().prepared);
}

#[tokio::test]
async fn zero_chunk_size_or_retries_is_invalid_config() {
    init_tracing();
    for config in [config(0, 3), config(10, 0)] {
        let transport = MockTransport::new(random_payload(25));
        let storage = MemoryStorage::new();
        let mut t = transfer(config, &transport, &storage);

        let err = t.download().await.unwrap_err();
        assert_eq!(err.kind(), TransferErrorKind::InvalidConfig);
        assert!(transport.requests().is_empty());
    }
}

#[tokio::test]
async fn request_template_is_reused_with_range_overwritten() {
    init_tracing();
    let transport = MockTransport::new(random_payload(25));
    let storage = MemoryStorage::new();
    let config = config(10, 3)
        .method(Method::POST)
        .try_header("x-token", "abc")
        .unwrap()
        .header(RANGE, HeaderValue::from_static("bytes=999-"))
        .body("query=1");
    let mut t = transfer(config, &transport, &storage);

    assert!(t.download().await.unwrap());

    let requests = transport.requests();
    assert_eq!(requests.len(), 4);
    for req in &requests {
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.url.as_str(), "http://example.test/data.bin");
        assert_eq!(req.headers.get("x-token").unwrap(), "abc");
        assert_eq!(req.headers.get_all(RANGE).iter().count(), 1);
        assert_eq!(req.body.as_deref(), Some(&b"query=1"[..]));
    }
    assert_eq!(
        transport.range_headers(),
        vec!["bytes=0-0", "bytes=0-9", "bytes=10-19", "bytes=20-24"]
    );
}

#[tokio::test]
async fn session_can_be_reused_sequentially() {
    init_tracing();
    let payload = random_payload(25);
    let transport = MockTransport::new(payload.clone());
    let storage = MemoryStorage::new();
    let mut t = transfer(config(10, 3), &transport, &storage);

    assert!(t.download().await.unwrap());
    assert!(t.download().await.unwrap());

    // 第二次从零开始，目标被重新准备
    assert_eq!(transport.requests().len(), 8);
    assert_eq!(storage.data(), payload.to_vec());
    assert_eq!(t.downloaded_size(), 25);
}
