//! Read-only renderings of the manifest: nginx upstream and compose file.

use std::fmt::Write as _;

use crate::domain::manifest::InstanceSnapshot;

/// Host port the ganache service is published on.
pub const GANACHE_PORT: u16 = 7545;

/// Render an nginx `upstream edge_servers` block plus a server using it.
///
/// The alert event stream gets its own location with buffering disabled so
/// server-sent events reach clients immediately.
#[must_use]
pub fn render_nginx_upstream(instances: &[InstanceSnapshot]) -> String {
    let mut out = String::from("upstream edge_servers {\n");
    for inst in instances {
        let _ = writeln!(out, "    server localhost:{};", inst.port);
    }
    out.push_str(
        "}

server {
    listen 80;
    server_name edge-server;

    location / {
        proxy_pass http://edge_servers;
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
    }

    location /api/alert/events {
        proxy_pass http://edge_servers;
        proxy_http_version 1.1;
        proxy_set_header Connection \"\";
        proxy_buffering off;
        chunked_transfer_encoding off;
    }
}
",
    );
    out
}

/// Render a compose file with one `edge-server-<id>` service per instance
/// and a shared `ganache` service.
#[must_use]
pub fn render_compose(instances: &[InstanceSnapshot]) -> String {
    let mut out = String::from("services:\n");
    for inst in instances {
        let _ = write!(
            out,
            "  edge-server-{id}:
    image: node:18-alpine
    working_dir: /app
    volumes:
      - ./:/app
    ports:
      - \"{port}:{port}\"
    environment:
      - PORT={port}
      - GANACHE_RPC_URL=http://ganache:{GANACHE_PORT}
    command: npm start
    depends_on:
      - ganache

",
            id = inst.id,
            port = inst.port,
        );
    }
    let _ = write!(
        out,
        "  ganache:
    image: trufflesuite/ganache:latest
    ports:
      - \"{GANACHE_PORT}:{GANACHE_PORT}\"
    command: --host 0.0.0.0 --port {GANACHE_PORT}
"
    );
    out
}
