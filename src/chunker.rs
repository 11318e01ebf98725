//! Troceado de texto en ventanas de palabras solapadas y alineadas a frases.
//!
//! El algoritmo acumula frases hasta que la siguiente desbordaría el tamaño
//! máximo; entonces emite el chunk y arrastra al siguiente las últimas frases
//! que quepan en el solape. Una frase más larga que el máximo nunca se parte:
//! forma su propio chunk.

/// Tamaño máximo por defecto de un chunk, en palabras.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Solape por defecto entre chunks consecutivos, en palabras.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

const SENTENCE_DELIMITER: &str = ". ";

/// Estrategia de segmentación "texto → frases en orden".
pub trait SentenceSplitter: Send + Sync {
    fn split(&self, text: &str) -> Vec<String>;
}

/// Segmentación heurística: corta en el literal `". "` tras convertir los
/// saltos de línea en espacios. No entiende abreviaturas ni gramática.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodSpaceSplitter;

impl SentenceSplitter for PeriodSpaceSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        text.replace('\n', " ")
            .split(SENTENCE_DELIMITER)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Chunker configurable con una estrategia de segmentación intercambiable.
pub struct Chunker<S = PeriodSpaceSplitter> {
    max_words: usize,
    overlap_words: usize,
    splitter: S,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl Chunker {
    pub fn new(max_words: usize, overlap_words: usize) -> Self {
        Self::with_splitter(max_words, overlap_words, PeriodSpaceSplitter)
    }
}

impl<S: SentenceSplitter> Chunker<S> {
    pub fn with_splitter(max_words: usize, overlap_words: usize, splitter: S) -> Self {
        Self {
            max_words,
            overlap_words,
            splitter,
        }
    }

    /// Trocea `text`. Un texto vacío o sin frases útiles produce un vector vacío.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_words = 0usize;

        for sentence in self.splitter.split(text) {
            let sentence_words = word_count(&sentence);

            if current_words + sentence_words > self.max_words && !current.is_empty() {
                chunks.push(join_sentences(&current));
                let carried = self.carry_over(&current);
                current_words = carried.iter().map(|s| word_count(s)).sum();
                current = carried;
            }

            current.push(sentence);
            current_words += sentence_words;
        }

        if !current.is_empty() {
            chunks.push(join_sentences(&current));
        }

        chunks
    }

    /// Últimas frases del chunk cerrado cuyo total de palabras cabe en el solape.
    fn carry_over(&self, closed: &[String]) -> Vec<String> {
        let mut carried_words = 0usize;
        let mut taken = 0usize;

        for sentence in closed.iter().rev() {
            let words = word_count(sentence);
            if carried_words + words > self.overlap_words {
                break;
            }
            carried_words += words;
            taken += 1;
        }

        closed[closed.len() - taken..].to_vec()
    }
}

/// Atajo con la segmentación por defecto.
pub fn chunk_text(text: &str, max_words: usize, overlap_words: usize) -> Vec<String> {
    Chunker::new(max_words, overlap_words).chunk(text)
}

/// Recuento ingenuo de palabras separadas por espacios en blanco.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// El punto final no se duplica si la última frase ya termina en '.'.
fn join_sentences(sentences: &[String]) -> String {
    let mut joined = sentences.join(SENTENCE_DELIMITER);
    if !joined.ends_with('.') {
        joined.push('.');
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize, tag: &str) -> String {
        (0..n)
            .map(|i| format!("{tag}{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn empty_and_blank_text_produce_no_chunks() {
        assert!(chunk_text("", 500, 100).is_empty());
        assert!(chunk_text("   \n\t  ", 500, 100).is_empty());
        assert!(chunk_text(". . . ", 500, 100).is_empty());
    }

    #[test]
    fn short_sentences_flush_when_the_next_would_overflow() {
        assert_eq!(chunk_text("A. B. C.", 2, 0), vec!["A. B.", "C."]);
    }

    #[test]
    fn single_chunk_when_text_fits() {
        let chunks = chunk_text("Hello world. This is a test", 500, 100);
        assert_eq!(chunks, vec!["Hello world. This is a test."]);
    }

    #[test]
    fn newlines_are_treated_as_spaces() {
        let chunks = chunk_text("First line\ncontinues. Second", 500, 100);
        assert_eq!(chunks, vec!["First line continues. Second."]);
    }

    #[test]
    fn other_terminal_punctuation_still_gets_a_period() {
        assert_eq!(chunk_text("Why not?", 10, 0), vec!["Why not?."]);
    }

    #[test]
    fn oversized_sentence_is_kept_whole() {
        let big = words(12, "w");
        let text = format!("tiny. {big}. end");
        let chunks = chunk_text(&text, 5, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "tiny.");
        assert_eq!(chunks[1], format!("{big}."));
        assert_eq!(chunks[2], "end.");
    }

    #[test]
    fn overlap_carries_trailing_sentences_into_next_chunk() {
        // Cada frase tiene 2 palabras; máximo 6, solape 2.
        let text = "a b. c d. e f. g h. i j";
        let chunks = chunk_text(text, 6, 2);
        assert_eq!(chunks, vec!["a b. c d. e f.", "e f. g h. i j."]);
    }

    #[test]
    fn overlap_stops_at_first_sentence_that_does_not_fit() {
        // La penúltima frase (3 palabras) no cabe en un solape de 3 junto a la última.
        let text = "one. two three four. five. six seven";
        let chunks = chunk_text(text, 5, 3);
        assert_eq!(chunks[0], "one. two three four. five.");
        assert!(chunks[1].starts_with("five. six seven"));
    }

    #[test]
    fn chunks_respect_the_word_limit() {
        let text = (0..40)
            .map(|i| words(1 + i % 7, &format!("s{i}_")))
            .collect::<Vec<_>>()
            .join(". ");
        let chunks = chunk_text(&text, 20, 5);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(word_count(chunk) <= 20, "chunk demasiado largo: {chunk}");
        }
    }

    #[test]
    fn carried_tail_plus_next_sentence_may_exceed_the_limit() {
        // Tras el arrastre no se vuelve a comprobar el máximo.
        let chunks = chunk_text("a b c d. e f g h i", 6, 4);
        assert_eq!(chunks, vec!["a b c d.", "a b c d. e f g h i."]);
        assert_eq!(word_count(&chunks[1]), 9);
    }

    #[test]
    fn distinct_sentences_keep_original_order() {
        let sentences: Vec<String> = (0..30).map(|i| words(3, &format!("t{i}_"))).collect();
        let text = sentences.join(". ");
        let chunks = chunk_text(&text, 10, 4);

        let mut seen: Vec<String> = Vec::new();
        for chunk in &chunks {
            for sentence in PeriodSpaceSplitter.split(chunk.trim_end_matches('.')) {
                if !seen.contains(&sentence) {
                    seen.push(sentence);
                }
            }
        }
        assert_eq!(seen, sentences);
    }

    #[test]
    fn consecutive_chunks_share_the_carried_tail() {
        let sentences: Vec<String> = (0..12).map(|i| words(2, &format!("x{i}_"))).collect();
        let text = sentences.join(". ");
        let chunks = chunk_text(&text, 6, 2);
        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            let prev = PeriodSpaceSplitter.split(pair[0].trim_end_matches('.'));
            let next = PeriodSpaceSplitter.split(pair[1].trim_end_matches('.'));
            assert_eq!(prev.last(), next.first());
        }
    }

    struct LineSplitter;

    impl SentenceSplitter for LineSplitter {
        fn split(&self, text: &str) -> Vec<String> {
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        }
    }

    #[test]
    fn splitter_can_be_swapped() {
        let chunker = Chunker::with_splitter(3, 0, LineSplitter);
        let chunks = chunker.chunk("uno dos\ntres cuatro\n\ncinco");
        assert_eq!(chunks, vec!["uno dos.", "tres cuatro. cinco."]);
    }
}
