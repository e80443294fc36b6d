use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use dojo_contract::UpdateEvent;
use futures::{Stream, StreamExt};
use std::convert::Infallible;

const UNTERMINATED_STREAM: &str = "update stream ended without a terminal event";

/// Encode one update event as an SSE `data:` frame.
pub fn sse_frame(event: &UpdateEvent) -> Bytes {
    match serde_json::to_string(event) {
        Ok(json) => Bytes::from(format!("data: {json}\n\n")),
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize SSE update event");
            Bytes::from_static(b"data: {\"type\":\"error\",\"error\":\"failed to serialize event\"}\n\n")
        }
    }
}

/// Frame `events` in order, stopping after the first terminal event.
///
/// A producer that ends early still yields one terminal `error` frame.
pub fn sse_body_stream<S>(mut events: S) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static
where
    S: Stream<Item = UpdateEvent> + Send + Unpin + 'static,
{
    async_stream::stream! {
        let mut terminated = false;
        while let Some(event) = events.next().await {
            let terminal = event.is_terminal();
            yield Ok::<Bytes, Infallible>(sse_frame(&event));
            if terminal {
                terminated = true;
                break;
            }
        }
        if !terminated {
            tracing::warn!("update stream closed before a terminal event");
            yield Ok::<Bytes, Infallible>(sse_frame(&UpdateEvent::error(UNTERMINATED_STREAM)));
        }
    }
}

pub fn sse_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    (headers, Body::from_stream(stream)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dojo_contract::Message;
    use futures::stream;

    async fn collect_frames<S>(events: S) -> Vec<String>
    where
        S: Stream<Item = UpdateEvent> + Send + Unpin + 'static,
    {
        sse_body_stream(events)
            .map(|chunk| String::from_utf8(chunk.unwrap().to_vec()).unwrap())
            .collect()
            .await
    }

    #[test]
    fn frame_is_data_line_with_blank_line_terminator() {
        let frame = sse_frame(&UpdateEvent::Done);
        assert_eq!(&frame[..], b"data: {\"type\":\"done\"}\n\n");
    }

    #[tokio::test]
    async fn stops_after_first_terminal_event() {
        let events = stream::iter(vec![
            UpdateEvent::node_update(Message::agent("hello")),
            UpdateEvent::Done,
            UpdateEvent::error("late"),
        ]);
        let frames = collect_frames(events).await;
        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains("\"type\":\"node_update\""));
        assert_eq!(frames[1], "data: {\"type\":\"done\"}\n\n");
    }

    #[tokio::test]
    async fn synthesizes_error_when_producer_ends_early() {
        let events = stream::iter(vec![UpdateEvent::node_update(Message::agent("partial"))]);
        let frames = collect_frames(events).await;
        assert_eq!(frames.len(), 2);
        let last: serde_json::Value =
            serde_json::from_str(frames[1].trim_start_matches("data: ").trim()).unwrap();
        assert_eq!(last["type"], "error");
        assert_eq!(last["error"], UNTERMINATED_STREAM);
    }

    #[tokio::test]
    async fn empty_producer_still_terminates() {
        let frames = collect_frames(stream::iter(Vec::<UpdateEvent>::new())).await;
        assert_eq!(frames.len(), 1);
        assert!(frames[0].contains("\"type\":\"error\""));
    }

    #[test]
    fn response_carries_event_stream_headers() {
        let resp = sse_response(stream::empty::<Result<Bytes, Infallible>>());
        let headers = resp.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
    }
}
