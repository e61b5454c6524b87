use bookrag_core::chunker::{chunk_text, Chunker};

fn contents(text: &str, size: usize, overlap: usize) -> Vec<String> {
    chunk_text(text, "book.txt", size, overlap).into_iter().map(|c| c.content).collect()
}

#[test]
fn empty_and_blank_input_yield_no_chunks() {
    assert!(chunk_text("", "a.txt", 10, 2).is_empty());
    assert!(chunk_text(" \n\t  \r\n", "a.txt", 10, 2).is_empty());
}

#[test]
fn short_text_is_one_chunk_with_normalized_whitespace() {
    let chunks = chunk_text("Line one.\n\nLine   two.\tEnd", "a.txt", 100, 10);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "Line one. Line two. End");
    assert_eq!(chunks[0].metadata.source, "a.txt");
    assert_eq!(chunks[0].metadata.start_char, 0);
}

#[test]
fn overlap_window_seeds_the_next_chunk() {
    let got = contents("Aaaa. Bbbb. Cccc.", 10, 3);
    assert_eq!(got, vec!["Aaaa.", "aa. Bbbb.", "bb. Cccc."]);
}

#[test]
fn zero_overlap_starts_fresh() {
    let got = contents("Aaaa. Bbbb. Cccc.", 10, 0);
    assert_eq!(got, vec!["Aaaa.", "Bbbb.", "Cccc."]);
}

#[test]
fn oversized_sentence_is_never_split() {
    let sentence = "This single sentence is definitely much longer than twenty characters.";
    let chunks = chunk_text(sentence, "big.txt", 20, 5);
    assert_eq!(chunks.len(), 1, "one oversized chunk");
    assert_eq!(chunks[0].content, sentence);
    // buffer is " " + sentence
    assert_eq!(chunks[0].metadata.start_char, sentence.chars().count() + 1 - 20);
}

#[test]
fn oversized_sentence_between_short_ones_stands_alone() {
    let long = "An extremely long sentence that cannot possibly fit in the configured size.";
    let text = format!("Hi. {long} Bye.");
    let got = contents(&text, 20, 0);
    assert_eq!(got, vec!["Hi.".to_string(), long.to_string(), "Bye.".to_string()]);
}

#[test]
fn lengths_are_counted_in_chars() {
    // 9 + 6 chars fit in 15; the same text measured in bytes would not.
    let got = contents("Ünïcödé. Çhårs.", 15, 3);
    assert_eq!(got, vec!["Ünïcödé. Çhårs."]);
}

#[test]
fn every_sentence_is_covered_in_order() {
    let sentences: Vec<String> = (0..60).map(|i| format!("Sentence number {i} talks about topic {i}.")).collect();
    let text = sentences.join("  \n");
    let chunks = Chunker::new(120, 30).chunk(&text, "long.txt");
    assert!(chunks.len() > 1);

    let mut last_chunk = 0usize;
    for sentence in &sentences {
        let found = chunks
            .iter()
            .enumerate()
            .skip(last_chunk)
            .find(|(_, c)| c.content.contains(sentence.as_str()))
            .map(|(i, _)| i);
        let found = found.unwrap_or_else(|| panic!("sentence not covered: {sentence}"));
        last_chunk = found;
    }
}

#[test]
fn overlap_prefix_is_a_bounded_suffix_of_the_previous_chunk() {
    let text: String = (0..40).map(|i| format!("Fact {i} is stated here. ")).collect();
    let overlap = 12;
    let chunks = chunk_text(&text, "facts.txt", 80, overlap);
    assert!(chunks.len() > 2);
    for pair in chunks.windows(2) {
        let (prev, cur) = (&pair[0].content, &pair[1].content);
        let ok = (1..=overlap.min(cur.len())).any(|p| prev.ends_with(&cur[..p]) && cur[p..].starts_with(' '));
        assert!(ok, "chunk {cur:?} does not start with a <= {overlap} char tail of {prev:?}");
    }
}

#[test]
fn chunks_respect_size_unless_a_sentence_is_oversized() {
    let text: String = (0..30).map(|i| format!("Item {i} ok. ")).collect();
    let size = 40;
    for chunk in chunk_text(&text, "items.txt", size, 8) {
        // the joining space is not counted against the budget
        assert!(chunk.content.chars().count() <= size + 1, "{:?}", chunk.content);
        assert!(chunk.metadata.start_char <= 1);
    }
}
