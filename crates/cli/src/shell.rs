//! Line-oriented shell commands.
//!
//! Each input line is split into words (double or single quotes group words
//! containing spaces, such as a card number) and parsed with clap into a
//! [`ShellCommand`].

use clap::{Parser, Subcommand};

/// Errors from splitting or parsing a shell line.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Unterminated quote")]
    UnterminatedQuote,
    #[error("{0}")]
    Clap(#[from] clap::Error),
}

#[derive(Parser, Debug)]
#[command(name = "bookshop>", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

/// A single shell command.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Search the catalog (blank query uses the default)
    Search {
        /// Search terms
        terms: Vec<String>,
    },
    /// Next page of search results
    Next,
    /// Previous page of search results
    Prev,
    /// Show book details
    Show {
        /// Book ID
        id: String,
    },
    /// Add a book to the basket
    Add {
        /// Book ID
        id: String,
    },
    /// Increase the quantity of a basket line
    Inc {
        /// Book ID
        id: String,
    },
    /// Decrease the quantity of a basket line (removes it at zero)
    Dec {
        /// Book ID
        id: String,
    },
    /// Remove a line from the basket
    #[command(alias = "rm")]
    Remove {
        /// Book ID
        id: String,
    },
    /// Empty the basket
    Clear,
    /// Show the basket and totals
    #[command(alias = "basket")]
    Cart,
    /// Start checkout
    Checkout,
    /// Submit the address step
    Address {
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        address: String,
    },
    /// Submit the payment step
    Payment {
        /// Card number as "1234 5678 9012 3456"
        #[arg(long, default_value = "")]
        card: String,
        /// Expiry as MM/YY
        #[arg(long, default_value = "")]
        expiry: String,
        #[arg(long, default_value = "")]
        cvc: String,
    },
    /// Go back to the address step
    Back,
    /// Cancel checkout
    Cancel,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Parse one input line. Returns `Ok(None)` for blank lines and comments.
///
/// # Errors
///
/// Returns [`ParseError`] for unbalanced quotes or unknown commands. Help
/// requests also come back as [`ParseError::Clap`] carrying the help text.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let words = split_words(trimmed)?;
    let parsed = ShellLine::try_parse_from(words)?;
    Ok(Some(parsed.command))
}

/// Split a line into words, honouring single and double quotes.
///
/// # Errors
///
/// Returns [`ParseError::UnterminatedQuote`] if a quote is left open.
pub fn split_words(line: &str) -> Result<Vec<String>, ParseError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(ParseError::UnterminatedQuote);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
