use thiserror::Error;

pub type FormatResult<T> = Result<T, FormatError>;

/// Fatal parse failure: malformed XML or a missing/misnamed root element.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of file at {pos}: expected {expected}")]
    UnexpectedEof { pos: usize, expected: String },

    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },

    #[error("Lexer error at {pos}")]
    LexerError { pos: usize },

    #[error("Document has no root element")]
    MissingRoot,

    #[error("Unexpected root element at {pos}: expected <{expected}>, found <{found}>")]
    WrongRoot {
        pos: usize,
        expected: String,
        found: String,
    },
}

impl FormatError {
    pub fn unexpected_token(pos: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize, expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            pos,
            expected: expected.into(),
        }
    }

    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }

    pub fn lexer_error(pos: usize) -> Self {
        Self::LexerError { pos }
    }

    pub fn wrong_root(pos: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::WrongRoot {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Byte offset the error points at, if any
    pub fn pos(&self) -> Option<usize> {
        match self {
            FormatError::UnexpectedToken { pos, .. }
            | FormatError::UnexpectedEof { pos, .. }
            | FormatError::InvalidSyntax { pos, .. }
            | FormatError::LexerError { pos }
            | FormatError::WrongRoot { pos, .. } => Some(*pos),
            FormatError::MissingRoot => None,
        }
    }
}

/// Pretty-print an error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &FormatError) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    // ariadne counts characters; error positions are byte offsets
    let byte_pos = error
        .pos()
        .unwrap_or(source.len().saturating_sub(1))
        .min(source.len());
    let start = char_index(source, byte_pos);
    let end = (start + 1).min(source.chars().count());

    let label_message = match error {
        FormatError::UnexpectedToken { expected, .. } => format!("expected {}", expected),
        FormatError::UnexpectedEof { expected, .. } => format!("expected {}", expected),
        FormatError::InvalidSyntax { message, .. } => message.clone(),
        FormatError::LexerError { .. } => "not valid XML markup".to_string(),
        FormatError::MissingRoot => "no root element".to_string(),
        FormatError::WrongRoot { expected, .. } => format!("root must be <{}>", expected),
    };

    let mut output = Vec::new();
    let report = Report::build(ReportKind::Error, filename, start)
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, start..end))
                .with_color(Color::Red)
                .with_message(label_message),
        )
        .finish();

    if report
        .write((filename, Source::from(source)), &mut output)
        .is_err()
    {
        return error.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|_| error.to_string())
}

/// Character index of the character containing byte `pos`
#[cfg(feature = "pretty-errors")]
fn char_index(source: &str, pos: usize) -> usize {
    source
        .char_indices()
        .take_while(|(offset, _)| *offset < pos)
        .count()
        .saturating_sub(usize::from(!source.is_char_boundary(pos)))
}
