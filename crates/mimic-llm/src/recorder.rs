//! Per-request generation transcripts
//!
//! A [`GenerationRecorder`] accumulates the outbound request and everything
//! the model streams back, then hands the transcript to a [`TranscriptSink`]
//! exactly once when the request finishes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::{StreamExt, stream};

use crate::types::{ChatChunk, ChatStream};

const REQUEST_HEADER: &str = "Request: \n";
const OUTPUT_HEADER: &str = "\nOutput: \n";
const REASONING_HEADER: &str = "\nReasoning: \n";
const ERROR_HEADER: &str = "\nError: \n";

/// Destination for finished transcripts
pub trait TranscriptSink: Send + Sync {
    /// A request that completed normally
    fn completed(&self, transcript: &str);

    /// A request that ended in failure
    fn failed(&self, transcript: &str, cause: &str);
}

/// Sink that logs transcripts under the `mimic::generation` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TranscriptSink for TracingSink {
    fn completed(&self, transcript: &str) {
        tracing::info!(target: "mimic::generation", "{transcript}");
    }

    fn failed(&self, transcript: &str, cause: &str) {
        tracing::error!(target: "mimic::generation", error = %cause, "{transcript}");
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Init,
    PartialOutput,
    PartialReasoning,
}

#[derive(Debug, Default)]
struct RecorderBuffer {
    text: String,
    mode: Mode,
}

impl RecorderBuffer {
    fn append_in_mode(&mut self, mode: Mode, header: &str, text: &str) {
        if self.mode != mode {
            self.text.push_str(header);
            self.mode = mode;
        }
        self.text.push_str(text);
    }

    fn take(&mut self) -> String {
        self.mode = Mode::Init;
        std::mem::take(&mut self.text)
    }
}

/// Transcript accumulator for one in-flight request
pub struct GenerationRecorder {
    buffer: Mutex<RecorderBuffer>,
    sink: Arc<dyn TranscriptSink>,
}

impl GenerationRecorder {
    /// Recorder that flushes into `sink`
    pub fn new(sink: Arc<dyn TranscriptSink>) -> Self {
        Self {
            buffer: Mutex::new(RecorderBuffer::default()),
            sink,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecorderBuffer> {
        // The buffer is plain text; a panic mid-append cannot leave it invalid
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the outbound request
    pub fn on_request(&self, text: &str) {
        let mut buffer = self.lock();
        buffer.text.push_str(REQUEST_HEADER);
        buffer.text.push_str(text);
    }

    /// Record a piece of model output
    pub fn on_partial_output(&self, text: &str) {
        self.lock().append_in_mode(Mode::PartialOutput, OUTPUT_HEADER, text);
    }

    /// Record a piece of model reasoning
    pub fn on_partial_reasoning(&self, text: &str) {
        self.lock().append_in_mode(Mode::PartialReasoning, REASONING_HEADER, text);
    }

    /// Record the deltas of a chunk's first choice
    pub fn on_chunk(&self, chunk: &ChatChunk) {
        let Some(choice) = chunk.first_choice() else {
            return;
        };

        if let Some(content) = choice.delta.content.as_deref() {
            self.on_partial_output(content);
        }
        if let Some(reasoning) = choice.delta.reasoning_content.as_deref() {
            self.on_partial_reasoning(reasoning);
        }
    }

    /// Emit the transcript and reset; does nothing when nothing was recorded
    pub fn dump(&self) {
        let mut buffer = self.lock();
        if buffer.text.is_empty() {
            return;
        }

        let transcript = buffer.take();
        self.sink.completed(&transcript);
    }

    /// Append the failure cause, emit the transcript as an error and reset
    pub fn dump_on_error(&self, cause: &str) {
        let mut buffer = self.lock();
        buffer.text.push_str(ERROR_HEADER);
        buffer.text.push_str(cause);

        let transcript = buffer.take();
        self.sink.failed(&transcript, cause);
    }
}

/// Flushes the recorder once, reporting cancellation if the stream is dropped early
struct FlushGuard {
    recorder: GenerationRecorder,
    flushed: bool,
}

impl FlushGuard {
    fn complete(mut self) {
        self.flushed = true;
        self.recorder.dump();
    }

    fn fail(mut self, cause: &str) {
        self.flushed = true;
        self.recorder.dump_on_error(cause);
    }
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        if !self.flushed {
            self.recorder.dump_on_error("stream cancelled by consumer");
        }
    }
}

/// Record every chunk of `inner` and flush when the stream finishes
///
/// The first error is recorded, forwarded, and ends the stream.
pub fn record_stream(recorder: GenerationRecorder, inner: ChatStream) -> ChatStream {
    let guard = FlushGuard {
        recorder,
        flushed: false,
    };

    Box::pin(stream::unfold((inner, Some(guard)), |(mut inner, guard)| async move {
        let guard = guard?;

        match inner.next().await {
            Some(Ok(chunk)) => {
                guard.recorder.on_chunk(&chunk);
                Some((Ok(chunk), (inner, Some(guard))))
            }
            Some(Err(e)) => {
                guard.fail(&e.to_string());
                Some((Err(e), (inner, None)))
            }
            None => {
                guard.complete();
                None
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::error::LlmError;
    use crate::types::{ChunkChoice, ChunkDelta};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Record {
        Completed(String),
        Failed(String, String),
    }

    #[derive(Default)]
    struct MemorySink {
        records: Mutex<Vec<Record>>,
    }

    impl MemorySink {
        fn records(&self) -> Vec<Record> {
            self.records.lock().unwrap().clone()
        }
    }

    impl TranscriptSink for MemorySink {
        fn completed(&self, transcript: &str) {
            self.records.lock().unwrap().push(Record::Completed(transcript.to_owned()));
        }

        fn failed(&self, transcript: &str, cause: &str) {
            self.records
                .lock()
                .unwrap()
                .push(Record::Failed(transcript.to_owned(), cause.to_owned()));
        }
    }

    fn recorder() -> (GenerationRecorder, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        (GenerationRecorder::new(Arc::clone(&sink) as Arc<dyn TranscriptSink>), sink)
    }

    fn chunk(content: Option<&str>, reasoning: Option<&str>) -> ChatChunk {
        ChatChunk {
            id: None,
            model: "m".to_owned(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: content.map(str::to_owned),
                    reasoning_content: reasoning.map(str::to_owned),
                },
                finish_reason: None,
            }],
        }
    }

    #[test]
    fn request_then_output() {
        let (recorder, sink) = recorder();
        recorder.on_request("R");
        recorder.on_partial_output("ab");
        recorder.on_partial_output("cd");
        recorder.dump();

        assert_eq!(sink.records(), [Record::Completed("Request: \nR\nOutput: \nabcd".to_owned())]);
    }

    #[test]
    fn each_mode_run_gets_a_header() {
        let (recorder, sink) = recorder();
        recorder.on_partial_reasoning("think");
        recorder.on_partial_reasoning("ing");
        recorder.on_partial_output("answer");
        recorder.on_partial_reasoning("more");
        recorder.dump();

        assert_eq!(
            sink.records(),
            [Record::Completed(
                "\nReasoning: \nthinking\nOutput: \nanswer\nReasoning: \nmore".to_owned()
            )]
        );
    }

    #[test]
    fn empty_dump_emits_nothing() {
        let (recorder, sink) = recorder();
        recorder.dump();
        assert!(sink.records().is_empty());
    }

    #[test]
    fn dump_resets_buffer_and_mode() {
        let (recorder, sink) = recorder();
        recorder.on_partial_output("first");
        recorder.dump();
        recorder.on_partial_output("second");
        recorder.dump();
        recorder.dump();

        assert_eq!(
            sink.records(),
            [
                Record::Completed("\nOutput: \nfirst".to_owned()),
                Record::Completed("\nOutput: \nsecond".to_owned()),
            ]
        );
    }

    #[test]
    fn error_dump_appends_cause() {
        let (recorder, sink) = recorder();
        recorder.on_request("R");
        recorder.on_partial_output("par");
        recorder.dump_on_error("upstream reset");

        assert_eq!(
            sink.records(),
            [Record::Failed(
                "Request: \nR\nOutput: \npar\nError: \nupstream reset".to_owned(),
                "upstream reset".to_owned()
            )]
        );
    }

    #[test]
    fn concurrent_appends_are_not_split() {
        let (recorder, sink) = recorder();
        let recorder = Arc::new(recorder);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let recorder = Arc::clone(&recorder);
                thread::spawn(move || {
                    for _ in 0..100 {
                        recorder.on_partial_output("0123456789");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        recorder.dump();

        let records = sink.records();
        let [Record::Completed(transcript)] = records.as_slice() else {
            panic!("expected one completed record, got {records:?}");
        };
        let body = transcript.strip_prefix("\nOutput: \n").unwrap();
        assert_eq!(body.len(), 8 * 100 * 10);
        assert!(body.as_bytes().chunks(10).all(|piece| piece == b"0123456789"));
    }

    #[test]
    fn chunk_content_recorded_before_reasoning() {
        let (recorder, sink) = recorder();
        recorder.on_chunk(&chunk(Some("C"), Some("R")));
        recorder.dump();

        assert_eq!(
            sink.records(),
            [Record::Completed("\nOutput: \nC\nReasoning: \nR".to_owned())]
        );
    }

    #[test]
    fn concurrent_dumps_never_split_appends() {
        let (recorder, sink) = recorder();
        let recorder = Arc::new(recorder);

        let producers: Vec<_> = (0..4)
            .map(|_| {
                let recorder = Arc::clone(&recorder);
                thread::spawn(move || {
                    for _ in 0..200 {
                        recorder.on_partial_output("0123456789");
                    }
                })
            })
            .collect();

        let flusher = {
            let recorder = Arc::clone(&recorder);
            thread::spawn(move || {
                for i in 0..50 {
                    if i % 2 == 0 {
                        recorder.dump();
                    } else {
                        recorder.dump_on_error("flush");
                    }
                    thread::yield_now();
                }
            })
        };

        for handle in producers {
            handle.join().unwrap();
        }
        flusher.join().unwrap();
        recorder.dump();

        let mut pieces = 0;
        for record in sink.records() {
            let text = match &record {
                Record::Completed(text) => text.as_str(),
                Record::Failed(text, _) => text.strip_suffix("\nError: \nflush").unwrap(),
            };
            let body = text.strip_prefix("\nOutput: \n").unwrap_or(text);
            assert_eq!(body.len() % 10, 0, "{record:?}");
            assert!(body.as_bytes().chunks(10).all(|piece| piece == b"0123456789"), "{record:?}");
            pieces += body.len() / 10;
        }
        assert_eq!(pieces, 4 * 200);
    }

    #[tokio::test]
    async fn record_stream_flushes_once_on_completion() {
        let (recorder, sink) = recorder();
        recorder.on_request("R");

        let inner: ChatStream = Box::pin(stream::iter([
            Ok::<_, LlmError>(chunk(None, Some("hm"))),
            Ok(chunk(Some("hi"), None)),
            Ok(chunk(Some("!"), None)),
        ]));

        let items: Vec<_> = record_stream(recorder, inner).collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(
            sink.records(),
            [Record::Completed("Request: \nR\nReasoning: \nhm\nOutput: \nhi!".to_owned())]
        );
    }

    #[tokio::test]
    async fn record_stream_stops_at_first_error() {
        let (recorder, sink) = recorder();

        let inner: ChatStream = Box::pin(stream::iter([
            Ok(chunk(Some("a"), None)),
            Err(LlmError::Streaming("bad chunk".to_owned())),
            Ok(chunk(Some("b"), None)),
        ]));

        let items: Vec<_> = record_stream(recorder, inner).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let Record::Failed(transcript, cause) = &records[0] else {
            panic!("expected failure record");
        };
        assert_eq!(transcript, "\nOutput: \na\nError: \nstreaming error: bad chunk");
        assert_eq!(cause, "streaming error: bad chunk");
    }

    #[tokio::test]
    async fn dropping_stream_reports_cancellation() {
        let (recorder, sink) = recorder();

        let inner: ChatStream = Box::pin(stream::iter([
            Ok::<_, LlmError>(chunk(Some("a"), None)),
            Ok(chunk(Some("b"), None)),
        ]));

        let mut recorded = record_stream(recorder, inner);
        recorded.next().await.unwrap().unwrap();
        drop(recorded);

        assert_eq!(
            sink.records(),
            [Record::Failed(
                "\nOutput: \na\nError: \nstream cancelled by consumer".to_owned(),
                "stream cancelled by consumer".to_owned()
            )]
        );
    }
}
