//! 组织标识端到端测试
//!
//! 覆盖 HTTP 桥接 → 网关请求头转发 → 拦截器链 → 处理器的完整链路，
//! 以及流式调用、并发隔离与客户端断开。

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use std::vec::IntoIter;

use flare_organization::{
    Context, LoggingInterceptor, OrganizationHeaderLayer, OrganizationHeaderMatcher,
    OrganizationStreamInterceptor, OrganizationUnaryInterceptor, RecoveryInterceptor,
    ServerStream, StreamChain, StreamServerInfo, UnaryChain, UnaryServerInfo, ValidatorChain,
    forward_headers, organization, serve_streaming, serve_unary,
};
use futures::StreamExt;
use futures::stream::{self, Iter};
use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
use tokio::sync::oneshot;
use tonic::{Code, Request, Status};
use tower::{Layer, ServiceExt, service_fn};

const ALLOWED: [&str; 3] = ["acme", "foo", "bar"];

fn unary_chain() -> UnaryChain<String, String> {
    UnaryChain::new()
        .with(LoggingInterceptor::new())
        .with(RecoveryInterceptor::new())
        .with(OrganizationUnaryInterceptor::new(ValidatorChain::standard(ALLOWED)))
}

fn stream_chain() -> StreamChain<String, String> {
    StreamChain::new()
        .with(LoggingInterceptor::new())
        .with(RecoveryInterceptor::new())
        .with(OrganizationStreamInterceptor::new(ValidatorChain::standard(ALLOWED)))
}

async fn dummy(ctx: Context, value: String) -> Result<String, Status> {
    Ok(format!("{}, {}", organization(&ctx), value))
}

fn http_status(code: Code) -> StatusCode {
    match code {
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 经过桥接层的 HTTP 请求，由"网关"转换为 gRPC 调用
async fn call_http(req: HttpRequest<()>) -> (StatusCode, String) {
    let chain = Arc::new(unary_chain());
    let gateway = service_fn(move |req: HttpRequest<()>| {
        let chain = Arc::clone(&chain);
        async move {
            let metadata = forward_headers(req.headers(), &OrganizationHeaderMatcher::new());
            let value = req.uri().path().rsplit('/').next().unwrap_or_default().to_string();
            let info = UnaryServerInfo::new("/dummy.v1.DummyService/GetDummy");

            let response = match chain
                .serve(Context::from_metadata(metadata), value, &info, &dummy)
                .await
            {
                Ok(body) => HttpResponse::new(body),
                Err(status) => {
                    let mut response = HttpResponse::new(status.message().to_string());
                    *response.status_mut() = http_status(status.code());
                    response
                }
            };
            Ok::<_, Infallible>(response)
        }
    });

    let response = OrganizationHeaderLayer::new()
        .layer(gateway)
        .oneshot(req)
        .await
        .unwrap();
    (response.status(), response.into_body())
}

#[tokio::test]
async fn http_path_prefix_reaches_handler() {
    let req = HttpRequest::get("/acme/api/dummy").body(()).unwrap();
    assert_eq!(call_http(req).await, (StatusCode::OK, "acme, dummy".to_string()));
}

#[tokio::test]
async fn http_header_reaches_handler() {
    let req = HttpRequest::get("/api/dummy")
        .header("X-Organization", "foo")
        .body(())
        .unwrap();
    assert_eq!(call_http(req).await, (StatusCode::OK, "foo, dummy".to_string()));
}

#[tokio::test]
async fn http_header_wins_over_path() {
    let req = HttpRequest::get("/acme/api/dummy")
        .header("X-Organization", "bar")
        .body(())
        .unwrap();
    // 请求头优先，路径不改写
    assert_eq!(call_http(req).await, (StatusCode::OK, "bar, dummy".to_string()));
}

#[tokio::test]
async fn http_without_organization_is_rejected() {
    let req = HttpRequest::get("/api/dummy").body(()).unwrap();
    assert_eq!(
        call_http(req).await,
        (StatusCode::BAD_REQUEST, "organization is required".to_string())
    );
}

#[tokio::test]
async fn http_unknown_organization_is_rejected() {
    let req = HttpRequest::get("/evil/api/dummy").body(()).unwrap();
    assert_eq!(
        call_http(req).await,
        (StatusCode::FORBIDDEN, "organization not allowed".to_string())
    );
}

#[tokio::test]
async fn concurrent_calls_are_isolated() {
    let chain = Arc::new(unary_chain());
    let mut handles = Vec::new();

    for i in 0..60 {
        let chain = Arc::clone(&chain);
        let org = ALLOWED[i % ALLOWED.len()];
        handles.push(tokio::spawn(async move {
            let mut request = Request::new(i.to_string());
            request
                .metadata_mut()
                .insert("x-organization", org.parse().unwrap());
            let info = UnaryServerInfo::new("/dummy.v1.DummyService/GetDummy");
            let handler = |ctx: Context, value: String| async move {
                tokio::task::yield_now().await;
                dummy(ctx, value).await
            };
            let response = serve_unary(&chain, &handler, &info, request).await.unwrap();
            (org, i, response.into_inner())
        }));
    }

    for handle in handles {
        let (org, i, reply) = handle.await.unwrap();
        assert_eq!(reply, format!("{org}, {i}"));
    }
}

fn stream_request(
    org: Option<&str>,
    messages: Vec<&str>,
) -> Request<Iter<IntoIter<Result<String, Status>>>> {
    let inbound = stream::iter(
        messages
            .into_iter()
            .map(|m| Ok(m.to_string()))
            .collect::<Vec<_>>(),
    );
    let mut request = Request::new(inbound);
    if let Some(org) = org {
        request
            .metadata_mut()
            .insert("x-organization", org.parse().unwrap());
    }
    request
}

fn echo_handler() -> Arc<dyn flare_organization::StreamHandler<String, String>> {
    Arc::new(|stream: Arc<dyn ServerStream<String, String>>| async move {
        while let Some(message) = stream.recv_message().await? {
            let reply = format!("{}, {}", organization(stream.context()), message);
            stream.send_message(reply).await?;
        }
        Ok::<(), Status>(())
    })
}

#[tokio::test]
async fn streaming_handler_sees_organization() {
    let response = serve_streaming(
        stream_chain(),
        echo_handler(),
        StreamServerInfo::bidi("/dummy.v1.DummyService/Echo"),
        stream_request(Some("bar"), vec!["a", "b", "c"]),
        8,
    )
    .unwrap();

    let replies: Vec<String> = response
        .into_inner()
        .map(|item| item.unwrap())
        .collect()
        .await;
    assert_eq!(replies, vec!["bar, a", "bar, b", "bar, c"]);
}

#[tokio::test]
async fn streaming_rejection_is_last_item() {
    let response = serve_streaming(
        stream_chain(),
        echo_handler(),
        StreamServerInfo::bidi("/dummy.v1.DummyService/Echo"),
        stream_request(None, vec!["a"]),
        8,
    )
    .unwrap();

    let items: Vec<Result<String, Status>> = response.into_inner().collect().await;
    assert_eq!(items.len(), 1);
    let status = items[0].as_ref().unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "organization is required");
}

#[tokio::test]
async fn client_disconnect_cancels_context() {
    let (token_tx, token_rx) = oneshot::channel();
    let token_tx = Arc::new(std::sync::Mutex::new(Some(token_tx)));

    let handler: Arc<dyn flare_organization::StreamHandler<String, String>> =
        Arc::new(move |stream: Arc<dyn ServerStream<String, String>>| {
            let token_tx = Arc::clone(&token_tx);
            async move {
                let token = stream.context().cancellation().clone();
                let tx = token_tx.lock().unwrap().take();
                if let Some(tx) = tx {
                    let _ = tx.send(token);
                }
                futures::future::pending::<()>().await;
                Ok::<(), Status>(())
            }
        });

    let response = serve_streaming(
        stream_chain(),
        handler,
        StreamServerInfo::new("/dummy.v1.DummyService/Watch", false, true),
        stream_request(Some("acme"), vec![]),
        1,
    )
    .unwrap();

    let token = token_rx.await.unwrap();
    assert!(!token.is_cancelled());

    drop(response);
    tokio::time::timeout(Duration::from_secs(5), token.cancelled())
        .await
        .expect("call context should be cancelled after client disconnect");
}
