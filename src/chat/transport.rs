use crate::chat::{Message, SubmissionId};
use crate::config::{Config, StreamProtocol};
use crate::error::TransportError;
use crate::event::AppEvent;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use std::sync::mpsc;
use tokio::runtime::Handle;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub chat_id: String,
    pub messages: Vec<Message>,
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    id: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

// Exactly one terminal event (`StreamEnd` or `ExchangeFailed`) is sent per call.
pub trait ChatTransport {
    fn start(&self, submission: SubmissionId, request: ChatRequest, tx: mpsc::Sender<AppEvent>);
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
    model: Option<String>,
    protocol: StreamProtocol,
    runtime_handle: Handle,
}

impl HttpTransport {
    pub fn new(config: &Config, runtime_handle: Handle) -> Self {
        Self {
            client: Client::new(),
            url: config.chat_url(),
            model: config.model.clone(),
            protocol: config.stream_protocol,
            runtime_handle,
        }
    }
}

impl ChatTransport for HttpTransport {
    fn start(&self, submission: SubmissionId, request: ChatRequest, tx: mpsc::Sender<AppEvent>) {
        let client = self.client.clone();
        let url = self.url.clone();
        let model = self.model.clone();
        let protocol = self.protocol;

        self.runtime_handle.spawn(async move {
            let delta_tx = tx.clone();
            let result = exchange(&client, &url, &request, model.as_deref(), protocol, move |text| {
                let _ = delta_tx.send(AppEvent::StreamDelta { submission, text });
            })
            .await;

            let event = match result {
                Ok(()) => {
                    tracing::debug!(%submission, "exchange finished");
                    AppEvent::StreamEnd { submission }
                }
                Err(err) => {
                    tracing::warn!(%submission, error = %err, "exchange failed");
                    AppEvent::ExchangeFailed {
                        submission,
                        message: err.to_string(),
                    }
                }
            };
            let _ = tx.send(event);
        });
    }
}

pub async fn exchange(
    client: &Client,
    url: &str,
    request: &ChatRequest,
    model: Option<&str>,
    protocol: StreamProtocol,
    mut on_delta: impl FnMut(String),
) -> Result<(), TransportError> {
    let body = ChatRequestBody {
        id: &request.chat_id,
        messages: &request.messages,
        model,
    };

    tracing::info!(url, messages = request.messages.len(), "sending chat request");
    let response = client.post(url).json(&body).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let mut decoder = StreamDecoder::new(protocol);
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for delta in decoder.push(&chunk)? {
            on_delta(delta);
        }
    }
    for delta in decoder.finish()? {
        on_delta(delta);
    }

    Ok(())
}

// Chunks may split lines and multi-byte characters anywhere.
#[derive(Debug)]
pub struct StreamDecoder {
    protocol: StreamProtocol,
    buffer: Vec<u8>,
}

impl StreamDecoder {
    pub fn new(protocol: StreamProtocol) -> Self {
        Self {
            protocol,
            buffer: Vec::new(),
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, TransportError> {
        self.buffer.extend_from_slice(chunk);
        match self.protocol {
            StreamProtocol::Text => Ok(self.take_text().into_iter().collect()),
            StreamProtocol::Data => {
                let mut deltas = Vec::new();
                while let Some(line_end) = self.buffer.iter().position(|byte| *byte == b'\n') {
                    let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
                    let line = String::from_utf8_lossy(&line);
                    if let Some(delta) = decode_data_part(line.trim())? {
                        deltas.push(delta);
                    }
                }
                Ok(deltas)
            }
        }
    }

    pub fn finish(&mut self) -> Result<Vec<String>, TransportError> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.is_empty() {
            return Ok(Vec::new());
        }
        let rest = String::from_utf8_lossy(&rest).into_owned();
        match self.protocol {
            StreamProtocol::Text => Ok(vec![rest]),
            StreamProtocol::Data => Ok(decode_data_part(rest.trim())?.into_iter().collect()),
        }
    }

    fn take_text(&mut self) -> Option<String> {
        let valid = match std::str::from_utf8(&self.buffer) {
            Ok(_) => self.buffer.len(),
            // Incomplete trailing sequence: hold it back for the next chunk.
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => self.buffer.len(),
        };
        if valid == 0 {
            return None;
        }
        let bytes: Vec<u8> = self.buffer.drain(..valid).collect();
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn decode_data_part(line: &str) -> Result<Option<String>, TransportError> {
    if line.is_empty() {
        return Ok(None);
    }
    let Some((code, payload)) = line.split_once(':') else {
        tracing::warn!(line, "skipping stream line without part code");
        return Ok(None);
    };

    let as_string = |payload: &str| {
        serde_json::from_str::<String>(payload).map_err(|source| TransportError::Decode {
            line: line.to_string(),
            source,
        })
    };

    match code {
        "0" => Ok(Some(as_string(payload)?).filter(|text| !text.is_empty())),
        "3" => Err(TransportError::Remote(as_string(payload)?)),
        "d" => {
            tracing::debug!(payload, "stream finish part");
            Ok(None)
        }
        _ => Ok(None),
    }
}
