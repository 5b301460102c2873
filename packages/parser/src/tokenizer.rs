use logos::Logos;
use std::fmt;

use crate::error::{FormatError, FormatResult};

/// Markup-level tokens of an MSF document.
///
/// Tags are lexed whole; the parser splits names and attributes out of the
/// tag slice. Everything between tags is a `Text` token, whitespace included.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token<'src> {
    /// `<?xml ...?>` and other processing instructions
    #[regex(r"<\?([^?]|\?[^>])*\?>", |lex| lex.slice())]
    ProcessingInstruction(&'src str),

    #[regex(r"<!--([^-]|-[^-])*-->")]
    Comment,

    #[regex(r"<![A-Za-z][^>]*>")]
    Doctype,

    /// Content is anything up to the first `]]>`, including trailing `]`s
    #[regex(r"<!\[CDATA\[([^\]]|\][^\]]|\]\]+[^\]>])*\]\]+>", |lex| {
        let s = lex.slice();
        &s[9..s.len() - 3]
    })]
    CData(&'src str),

    /// Start tag, including self-closing `<Name/>`
    #[regex(r#"<[A-Za-z_:]([^>"']|"[^"]*"|'[^']*')*>"#, |lex| lex.slice())]
    StartTag(&'src str),

    #[regex(r"</[A-Za-z_:][^>]*>", |lex| lex.slice())]
    EndTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::ProcessingInstruction(s) => write!(f, "processing instruction {}", s),
            Token::Comment => write!(f, "comment"),
            Token::Doctype => write!(f, "doctype"),
            Token::CData(_) => write!(f, "CDATA section"),
            Token::StartTag(s) => write!(f, "{}", s),
            Token::EndTag(s) => write!(f, "{}", s),
            Token::Text(s) => write!(f, "text {:?}", s),
        }
    }
}

/// Tokenize a source string.
///
/// Unlike a lenient lexer this fails on the first unlexable byte: any `<`
/// that does not open valid markup makes the document malformed.
pub fn tokenize(source: &str) -> FormatResult<Vec<(Token<'_>, std::ops::Range<usize>)>> {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok((token, span)),
            Err(()) => Err(FormatError::lexer_error(span.start)),
        })
        .collect()
}
