//! Studio-facing reverse proxy.
//!
//! Every forwarded request is rebuilt at the trust boundary: client
//! credentials and connection-scoped headers are dropped, the authenticated
//! user id is stamped into the identity headers, and the URI and Host are
//! rewritten to the studio's loopback address.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::{debug, error};

/// Connection-scoped request headers, dropped before the hop (RFC 9110 §7.6.1).
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("proxy-connection"),
    HeaderName::from_static("keep-alive"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Forward an authenticated request to the studio listening on `studio_port`.
///
/// The studio accepts the identity headers on faith, so they are rebuilt here
/// on every hop: whatever the client sent under those names (or under
/// `Cookie`/`Authorization`) never crosses.
pub async fn forward_to_studio(mut req: Request, user_id: &str, studio_port: u16) -> Response {
    if let Err(e) = prepare_for_studio(&mut req, user_id, studio_port) {
        error!("proxy request rebuild failed: {e}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    debug!(uri = %req.uri(), "forwarding to studio");

    match relay(req, studio_port).await {
        Ok(resp) => resp,
        Err(e) => {
            error!(studio_port, "studio hop failed: {e}");
            (StatusCode::BAD_GATEWAY, format!("studio unreachable: {e}")).into_response()
        }
    }
}

/// Re-address `req` to the studio and swap client credentials for the
/// gateway's identity headers.
fn prepare_for_studio(
    req: &mut Request,
    user_id: &str,
    studio_port: u16,
) -> Result<(), axum::http::Error> {
    let authority = format!("127.0.0.1:{studio_port}");

    let uri = {
        let path_and_query = req.uri().path_and_query().map_or("/", |pq| pq.as_str());
        Uri::builder()
            .scheme("http")
            .authority(authority.as_str())
            .path_and_query(path_and_query)
            .build()?
    };
    *req.uri_mut() = uri;

    let headers = req.headers_mut();

    headers.remove(header::COOKIE);
    headers.remove(header::AUTHORIZATION);
    headers.remove(header::PROXY_AUTHORIZATION);

    // insert() replaces every client-supplied value under these names.
    headers.insert(shared_types::USER_ID_HEADER, HeaderValue::from_str(user_id)?);
    headers.insert(
        shared_types::PROXY_AUTH_HEADER,
        HeaderValue::from_static("true"),
    );

    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
    headers.insert(header::HOST, HeaderValue::try_from(authority)?);

    Ok(())
}

/// One request over a fresh loopback HTTP/1.1 connection.
async fn relay(req: Request, studio_port: u16) -> anyhow::Result<Response> {
    let stream = TcpStream::connect(("127.0.0.1", studio_port)).await?;
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            error!("studio connection error: {e}");
        }
    });

    let resp = sender.send_request(req).await?;
    Ok(resp.map(|body| Body::new(body.map_err(std::io::Error::other))))
}
