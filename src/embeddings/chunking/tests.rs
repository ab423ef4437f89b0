use super::*;

/// Rebuild the original text from overlapping chunks by stripping each
/// chunk's longest prefix that is a suffix of the text rebuilt so far.
fn merge_overlapping(chunks: &[String]) -> String {
    let mut merged = String::new();

    for chunk in chunks {
        if merged.is_empty() {
            merged.push_str(chunk);
            continue;
        }

        let overlap = (0..=chunk.len())
            .rev()
            .find(|&len| chunk.is_char_boundary(len) && merged.ends_with(&chunk[..len]))
            .unwrap_or(0);

        if overlap == 0 {
            // No shared region: the joining space was the chunk boundary.
            merged.push(' ');
        }
        merged.push_str(chunk.get(overlap..).unwrap_or(""));
    }

    merged
}

fn sample_text(words: usize) -> String {
    (0..words)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn empty_input_yields_no_chunks() {
    let config = ChunkingConfig::default();

    assert!(chunk_text("", &config).is_empty());
    assert!(chunk_text("   \n\t  ", &config).is_empty());
}

#[test]
fn short_input_is_a_single_chunk() {
    let config = ChunkingConfig::default();

    let chunks = chunk_text("a short note", &config);

    assert_eq!(chunks, vec!["a short note".to_string()]);
}

#[test]
fn input_is_trimmed_before_splitting() {
    let config = ChunkingConfig::default();

    let chunks = chunk_text("  padded text  ", &config);

    assert_eq!(chunks, vec!["padded text".to_string()]);
}

#[test]
fn long_input_produces_multiple_bounded_chunks() {
    let config = ChunkingConfig::default();
    let text = sample_text(200);

    let chunks = chunk_text(&text, &config);

    assert!(chunks.len() > 1);
    // Chunks stay near the target; the slack is one word plus the seeded
    // overlap prefix.
    for chunk in &chunks {
        assert!(
            chunk.chars().count() <= config.chunk_size + config.chunk_overlap + 10,
            "chunk too large: {} chars",
            chunk.chars().count()
        );
    }
}

#[test]
fn consecutive_chunks_share_overlap() {
    let config = ChunkingConfig::default();
    let text = sample_text(200);

    let chunks = chunk_text(&text, &config);
    assert!(chunks.len() > 1);

    for pair in chunks.windows(2) {
        let first_words: Vec<&str> = pair[0].split(' ').collect();
        let second_words: Vec<&str> = pair[1].split(' ').collect();

        // The second chunk starts with a (possibly empty) run of words
        // copied from the end of the first chunk.
        let shared: Vec<&str> = second_words
            .iter()
            .take_while(|w| first_words.contains(w))
            .copied()
            .collect();

        if !shared.is_empty() {
            assert!(pair[0].ends_with(&shared.join(" ")));
        }
    }
}

#[test]
fn no_characters_are_dropped() {
    let config = ChunkingConfig::default();
    let text = sample_text(137);

    let chunks = chunk_text(&text, &config);

    assert_eq!(merge_overlapping(&chunks), text);
}

#[test]
fn reconstruction_preserves_interior_whitespace_runs() {
    let config = ChunkingConfig {
        chunk_size: 30,
        chunk_overlap: 8,
    };
    let text = "alpha  beta   gamma delta epsilon zeta eta theta iota kappa";

    let chunks = chunk_text(text, &config);

    assert!(chunks.len() > 1);
    assert_eq!(merge_overlapping(&chunks), text);
}

#[test]
fn newlines_stay_inside_chunks() {
    let config = ChunkingConfig {
        chunk_size: 25,
        chunk_overlap: 5,
    };
    let text = "first\nline continues here with more words to split across chunks";

    let chunks = chunk_text(text, &config);

    assert_eq!(merge_overlapping(&chunks), text);
    assert!(chunks.iter().any(|c| c.contains('\n')));
}

#[test]
fn oversized_word_becomes_its_own_chunk() {
    let config = ChunkingConfig {
        chunk_size: 10,
        chunk_overlap: 3,
    };
    let long_word = "x".repeat(40);
    let text = format!("aa bb {long_word} cc");

    let chunks = chunk_text(&text, &config);

    assert!(chunks.iter().any(|c| c.contains(&long_word)));
    assert_eq!(merge_overlapping(&chunks), text);
}

#[test]
fn nonempty_input_never_yields_empty_chunks() {
    let config = ChunkingConfig {
        chunk_size: 12,
        chunk_overlap: 4,
    };

    for text in ["x", "one two three four five six seven", &sample_text(50)] {
        let chunks = chunk_text(text, &config);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }
}
