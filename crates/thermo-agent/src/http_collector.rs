//! HTTP implementation of [`Collector`] on top of `ureq`

use std::io::Read;
use std::time::Duration;

use log::debug;
use thermo_core::transmit::{Collector, CollectorResponse, TransportError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Replies larger than this are cut off; the agent never looks at them anyway.
const MAX_REPLY_BYTES: u64 = 64 * 1024;

/// Posts payloads to `<base_url><path>`.
pub struct HttpCollector {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpCollector {
    pub fn new(base_url: &str) -> Self {
        // A redirected POST is re-sent as a bodyless GET, so the 3xx itself is the reply.
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .redirects(0)
            .build();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Collector for HttpCollector {
    fn submit(&mut self, path: &str, body: &[u8]) -> Result<CollectorResponse, TransportError> {
        let url = format!("{}{}", self.base_url, path);

        let response = match self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_bytes(body)
        {
            Ok(response) => response,
            // ureq reports 4xx/5xx as errors; to us they are still replies
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(match transport.kind() {
                    ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::Dns => {
                        TransportError::Connect(transport.to_string())
                    }
                    _ => TransportError::Io(transport.to_string()),
                });
            }
        };

        let status = response.status();
        let mut reply = Vec::new();
        if let Err(e) = response
            .into_reader()
            .take(MAX_REPLY_BYTES)
            .read_to_end(&mut reply)
        {
            debug!("Could not read collector reply body: {}", e);
            reply.clear();
        }

        Ok(CollectorResponse {
            status,
            body: reply,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::*;
    use thermo_core::{Reading, TransmitError, Transmitter};

    fn one_shot_server(status: &'static str) -> (String, JoinHandle<(String, Vec<u8>)>) {
        one_shot_server_with(status, "")
    }

    /// Serve exactly one request with `status` and any `extra_headers`
    /// (each ending in `\r\n`), handing back what was received.
    fn one_shot_server_with(
        status: &'static str,
        extra_headers: &'static str,
    ) -> (String, JoinHandle<(String, Vec<u8>)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                let end = line == "\r\n";
                head.push_str(&line);
                if end {
                    break;
                }
            }

            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();

            let reply = r#"{"status":"ok"}"#;
            write!(
                reader.get_mut(),
                "HTTP/1.1 {}\r\n{}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                extra_headers,
                reply.len(),
                reply
            )
            .unwrap();

            (head, body)
        });

        (base_url, handle)
    }

    #[test]
    fn test_posts_json_to_path() {
        let (base_url, server) = one_shot_server("201 Created");
        let mut collector = HttpCollector::new(&base_url);

        let response = collector
            .submit("/temperatures", br#"{"Key":"k"}"#)
            .unwrap();
        let (head, body) = server.join().unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.body, br#"{"status":"ok"}"#);
        assert!(head.starts_with("POST /temperatures HTTP/1.1\r\n"));
        assert!(head.to_ascii_lowercase().contains("content-type: application/json"));
        assert_eq!(body, br#"{"Key":"k"}"#);
    }

    #[test]
    fn test_error_status_is_a_response() {
        let (base_url, server) = one_shot_server("500 Internal Server Error");
        let mut collector = HttpCollector::new(&base_url);

        let response = collector.submit("/temperatures", b"{}").unwrap();
        server.join().unwrap();

        assert_eq!(response.status, 500);
    }

    #[test]
    fn test_redirect_is_returned_not_followed() {
        let (base_url, server) = one_shot_server_with("302 Found", "Location: /elsewhere\r\n");
        let mut collector = HttpCollector::new(&base_url);

        let response = collector.submit("/temperatures", b"{}").unwrap();
        let (head, _) = server.join().unwrap();

        assert_eq!(response.status, 302);
        assert!(head.starts_with("POST /temperatures HTTP/1.1\r\n"));
    }

    fn unused_port_url() -> String {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        format!("http://127.0.0.1:{}", port)
    }

    #[test]
    fn test_refused_connection_is_a_transport_error() {
        let mut collector = HttpCollector::new(&unused_port_url());

        assert!(matches!(
            collector.submit("/temperatures", b"{}"),
            Err(TransportError::Connect(_))
        ));
    }

    #[test]
    fn test_trailing_slash_is_dropped() {
        assert_eq!(
            HttpCollector::new("http://collector:8080/").base_url(),
            "http://collector:8080"
        );
    }

    #[test]
    fn test_transmit_over_http_accepts_created() {
        let (base_url, server) = one_shot_server("201 Created");
        let mut transmitter = Transmitter::new(HttpCollector::new(&base_url));

        assert_eq!(transmitter.transmit(&Reading::initial("dev-1")), Ok(()));

        let (_, body) = server.join().unwrap();
        assert!(String::from_utf8(body).unwrap().starts_with(r#"{"Key":"dev-1","#));
    }

    #[test]
    fn test_transmit_over_http_rejects_other_statuses() {
        for (status, code) in [("500 Internal Server Error", 500), ("200 OK", 200)] {
            let (base_url, server) = one_shot_server(status);
            let mut transmitter = Transmitter::new(HttpCollector::new(&base_url));

            assert_eq!(
                transmitter.transmit(&Reading::initial("k")),
                Err(TransmitError::Rejected { status: code })
            );
            server.join().unwrap();
        }
    }

    #[test]
    fn test_transmit_over_http_rejects_redirect() {
        let (base_url, server) = one_shot_server_with("302 Found", "Location: /elsewhere\r\n");
        let mut transmitter = Transmitter::new(HttpCollector::new(&base_url));

        assert_eq!(
            transmitter.transmit(&Reading::initial("k")),
            Err(TransmitError::Rejected { status: 302 })
        );
        server.join().unwrap();
    }

    #[test]
    fn test_transmit_over_http_refused_is_transport_failure() {
        let mut transmitter = Transmitter::new(HttpCollector::new(&unused_port_url()));

        assert!(matches!(
            transmitter.transmit(&Reading::initial("k")),
            Err(TransmitError::Transport(TransportError::Connect(_)))
        ));
    }
}
