/// A maximal run of characters that are either all word characters or all
/// separators (punctuation, whitespace, symbols).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub text: &'a str,
    pub kind: SpanKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Word,
    Separator,
}

/// Unicode letters and digits form words; everything else separates them.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

pub fn is_word(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_word_char)
}

/// Split `text` into alternating word and separator spans. Concatenating the
/// spans in order reproduces the input exactly.
pub fn segment(text: &str) -> Segments<'_> {
    Segments { rest: text }
}

pub struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Span<'a>;

    fn next(&mut self) -> Option<Span<'a>> {
        let first = self.rest.chars().next()?;
        let in_word = is_word_char(first);
        let end = self
            .rest
            .char_indices()
            .find(|&(_, c)| is_word_char(c) != in_word)
            .map_or(self.rest.len(), |(i, _)| i);
        let (text, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(Span {
            text,
            kind: if in_word {
                SpanKind::Word
            } else {
                SpanKind::Separator
            },
        })
    }
}
