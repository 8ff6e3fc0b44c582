use anyhow::{bail, Context};
use url::Url;

use super::packet::DEFAULT_NAMESPACE;

const SOCKET_IO_PATH: &str = "/socket.io/";

/// Where to open the WebSocket and which Socket.IO namespace to join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub namespace: String,
}

/// Turn a configured coordinator URL into the Socket.IO WebSocket endpoint.
///
/// `http` becomes `ws` and `https` becomes `wss`. The Engine.IO path is
/// always `/socket.io/`; a path on the configured URL names the namespace
/// instead, so `https://host/agents` joins `/agents`. Any query already
/// present is kept and the Engine.IO transport parameters are appended.
pub fn socket_url(server: &str) -> anyhow::Result<Endpoint> {
    let server = server.trim();
    let parsed =
        Url::parse(server).with_context(|| format!("invalid server URL '{server}'"))?;
    let scheme = match parsed.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => bail!("unsupported server URL scheme '{other}'"),
    };
    if parsed.host_str().map_or(true, str::is_empty) {
        bail!("server URL '{server}' has no host");
    }

    let namespace = match parsed.path() {
        "" | "/" => DEFAULT_NAMESPACE.to_string(),
        path => path.to_string(),
    };

    let mut url = parsed;
    if url.set_scheme(scheme).is_err() {
        bail!("cannot use scheme '{scheme}' for '{server}'");
    }
    url.set_path(SOCKET_IO_PATH);
    url.set_fragment(None);
    url.query_pairs_mut()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket");

    Ok(Endpoint {
        url: url.into(),
        namespace,
    })
}
