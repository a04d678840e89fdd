use super::*;
use crate::completion::Role;
use crate::test_support::{ScriptedCompletion, no_choices, reply};

fn context_chunk(kind: &str, text: &str, distance: f32) -> RetrievedChunk {
    RetrievedChunk {
        text: text.to_string(),
        metadata: ChunkMetadata {
            source: format!("{}.json", kind),
            id: format!("{}-1", kind),
            title: text.to_string(),
            kind: kind.to_string(),
        },
        distance,
    }
}

fn sample_context() -> Vec<RetrievedChunk> {
    vec![
        context_chunk("datasets", "Title: Rainfall India", 0.2),
        context_chunk("models", "Title: CropNet", 0.3),
        context_chunk("toolkit", "Title: AgriKit", 0.5),
        context_chunk("datasets", "Title: Soil Survey", 0.4),
    ]
}

fn synthesizer(client: &Arc<ScriptedCompletion>, max_continuations: usize) -> AnswerSynthesizer {
    AnswerSynthesizer::new(
        Arc::clone(client) as Arc<dyn CompletionClient>,
        max_continuations,
    )
}

#[test]
fn complete_first_answer_needs_no_continuation() {
    let client = Arc::new(ScriptedCompletion::new(vec![reply(
        "**Rainfall India** covers monsoon data.\n<END_OF_ANSWER>",
        "stop",
    )]));

    let answer = synthesizer(&client, DEFAULT_MAX_CONTINUATIONS)
        .synthesize("Which datasets cover rainfall?", &sample_context())
        .expect("synthesis succeeds");

    assert_eq!(client.call_count(), 1);
    assert_eq!(answer.answer, "**Rainfall India** covers monsoon data.");
    assert_eq!(answer.confidence, 0.74);
    assert_eq!(answer.sources.len(), 4);
    assert_eq!(answer.sources[0].id, "datasets-1");
    assert_eq!(answer.sources[3].title, "Title: Soil Survey");
}

#[test]
fn truncated_answer_is_continued_and_concatenated() {
    let client = Arc::new(ScriptedCompletion::new(vec![
        reply("Part A", "length"),
        reply("Part B <END_OF_ANSWER>", "stop"),
    ]));

    let answer = synthesizer(&client, DEFAULT_MAX_CONTINUATIONS)
        .synthesize("q", &sample_context())
        .expect("synthesis succeeds");

    assert_eq!(client.call_count(), 2);
    assert_eq!(answer.answer, "Part A\nPart B");

    let calls = client.calls();
    let continuation = &calls[1];
    assert_eq!(continuation.len(), 4);
    assert_eq!(continuation[2], Message::assistant("Part A"));
    assert_eq!(continuation[3].role, Role::User);
    assert!(continuation[3].content.contains(END_OF_ANSWER));
}

#[test]
fn missing_sentinel_continues_even_when_stopped() {
    let client = Arc::new(ScriptedCompletion::new(vec![
        reply("Started", "stop"),
        reply("Finished\n<END_OF_ANSWER>\n", "stop"),
    ]));

    let answer = synthesizer(&client, DEFAULT_MAX_CONTINUATIONS)
        .synthesize("q", &sample_context())
        .expect("synthesis succeeds");

    assert_eq!(client.call_count(), 2);
    assert_eq!(answer.answer, "Started\nFinished");
}

#[test]
fn length_finish_continues_even_with_sentinel() {
    let client = Arc::new(ScriptedCompletion::new(vec![
        reply("One <END_OF_ANSWER>", "length"),
        reply("Two <END_OF_ANSWER>", "stop"),
    ]));

    let answer = synthesizer(&client, DEFAULT_MAX_CONTINUATIONS)
        .synthesize("q", &sample_context())
        .expect("synthesis succeeds");

    assert_eq!(client.call_count(), 2);
    assert_eq!(answer.answer, "One \nTwo");
}

#[test]
fn continuation_calls_are_bounded() {
    let script = (0..20).map(|i| reply(&format!("part {}", i), "length")).collect();
    let client = Arc::new(ScriptedCompletion::new(script));

    let answer = synthesizer(&client, DEFAULT_MAX_CONTINUATIONS)
        .synthesize("q", &sample_context())
        .expect("exhausting the bound is not an error");

    assert_eq!(client.call_count(), DEFAULT_MAX_CONTINUATIONS + 1);
    assert!(answer.answer.starts_with("part 0\npart 1"));
    assert!(answer.answer.ends_with("part 7"));
}

#[test]
fn zero_continuations_allowed() {
    let client = Arc::new(ScriptedCompletion::new(vec![reply("Partial", "length")]));

    let answer = synthesizer(&client, 0)
        .synthesize("q", &sample_context())
        .expect("synthesis succeeds");

    assert_eq!(client.call_count(), 1);
    assert_eq!(answer.answer, "Partial");
}

#[test]
fn conversation_grows_with_each_continuation() {
    let client = Arc::new(ScriptedCompletion::new(vec![
        reply("A", "length"),
        reply("B", "length"),
        reply("C<END_OF_ANSWER>", "stop"),
    ]));

    synthesizer(&client, DEFAULT_MAX_CONTINUATIONS)
        .synthesize("q", &sample_context())
        .expect("synthesis succeeds");

    let calls = client.calls();
    let lengths: Vec<usize> = calls.iter().map(Vec::len).collect();
    assert_eq!(lengths, vec![2, 4, 6]);
    // Each assistant turn carries everything accumulated so far
    assert_eq!(calls[2][4], Message::assistant("A\nB"));
}

#[test]
fn empty_first_response_is_an_error() {
    let client = Arc::new(ScriptedCompletion::new(vec![no_choices()]));

    let err = synthesizer(&client, DEFAULT_MAX_CONTINUATIONS)
        .synthesize("q", &sample_context())
        .expect_err("no choices on the first call");

    assert!(matches!(
        err,
        RagError::Completion(CompletionError::EmptyChoices)
    ));
    assert_eq!(client.call_count(), 1);
}

#[test]
fn empty_continuation_keeps_partial_answer() {
    let client = Arc::new(ScriptedCompletion::new(vec![
        reply("Partial answer", "length"),
        no_choices(),
    ]));

    let answer = synthesizer(&client, DEFAULT_MAX_CONTINUATIONS)
        .synthesize("q", &sample_context())
        .expect("partial answer is kept");

    assert_eq!(client.call_count(), 2);
    assert_eq!(answer.answer, "Partial answer");
}

#[test]
fn transport_failure_is_fatal_at_any_step() {
    let client = Arc::new(ScriptedCompletion::new(vec![Err(
        CompletionError::Transport("connection refused".to_string()),
    )]));
    let err = synthesizer(&client, DEFAULT_MAX_CONTINUATIONS)
        .synthesize("q", &sample_context())
        .expect_err("transport failure");
    assert!(matches!(err, RagError::Completion(ref e) if e.is_transport()));

    let client = Arc::new(ScriptedCompletion::new(vec![
        reply("Half", "length"),
        Err(CompletionError::Status {
            status: 503,
            body: "busy".to_string(),
        }),
    ]));
    let err = synthesizer(&client, DEFAULT_MAX_CONTINUATIONS)
        .synthesize("q", &sample_context())
        .expect_err("continuation transport failure");
    assert!(matches!(
        err,
        RagError::Completion(CompletionError::Status { status: 503, .. })
    ));
}

#[test]
fn empty_context_has_zero_confidence() {
    let client = Arc::new(ScriptedCompletion::new(vec![reply(
        "No relevant information found.\n<END_OF_ANSWER>",
        "stop",
    )]));

    let answer = synthesizer(&client, DEFAULT_MAX_CONTINUATIONS)
        .synthesize("q", &[])
        .expect("synthesis succeeds");

    assert_eq!(answer.confidence, 0.0);
    assert!(answer.sources.is_empty());
    assert_eq!(answer.answer, "No relevant information found.");
}

#[test]
fn prompt_carries_context_and_question() {
    let client = Arc::new(ScriptedCompletion::new(vec![reply(
        "done <END_OF_ANSWER>",
        "stop",
    )]));

    synthesizer(&client, DEFAULT_MAX_CONTINUATIONS)
        .synthesize("Which models predict crop yield?", &sample_context()[..2])
        .expect("synthesis succeeds");

    let first = &client.calls()[0];
    assert_eq!(first[0].role, Role::System);
    assert!(first[0].content.contains(END_OF_ANSWER));
    assert_eq!(first[1].role, Role::User);
    assert!(first[1].content.contains(
        "**DATASETS**:\nTitle: Rainfall India\n\n**MODELS**:\nTitle: CropNet"
    ));
    assert!(first[1].content.ends_with("Which models predict crop yield?"));
}

#[test]
fn confidence_values() {
    assert_eq!(confidence(&[]), 0.0);
    assert_eq!(confidence(&[0.0]), 1.0);
    assert_eq!(confidence(&[0.2, 0.3, 0.5, 0.4]), 0.74);
    assert_eq!(confidence(&[1.0, 1.0]), 0.5);

    // Smaller distances never lower confidence
    let near = confidence(&[0.1, 0.2]);
    let far = confidence(&[0.8, 1.6]);
    assert!(near > far);
    assert!(far > 0.0 && near <= 1.0);
}

#[test]
fn sentinel_is_stripped_everywhere() {
    assert_eq!(
        strip_sentinel("  a <END_OF_ANSWER> b\n<END_OF_ANSWER>\n"),
        "a  b"
    );
    assert_eq!(strip_sentinel("<END_OF_ANSWER>"), "");
}

#[test]
fn conversation_is_append_only() {
    let base = Conversation::new("system", "user");
    let extended = base.with(Message::assistant("reply"));

    assert_eq!(base.len(), 2);
    assert_eq!(extended.len(), 3);
    assert_eq!(extended.messages()[..2], base.messages()[..]);
}

#[test]
fn answer_serializes_with_expected_fields() {
    let answer = Answer {
        answer: "text".to_string(),
        sources: vec![sample_context()[0].metadata.clone()],
        confidence: 0.74,
    };

    let json = serde_json::to_value(&answer).expect("answer serializes");
    assert_eq!(
        json,
        serde_json::json!({
            "answer": "text",
            "sources": [{
                "source": "datasets.json",
                "id": "datasets-1",
                "title": "Title: Rainfall India",
                "type": "datasets"
            }],
            "confidence": 0.74
        })
    );
}
