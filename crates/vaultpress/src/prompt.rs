//! Terminal conflict prompt

use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;
use vaultpress_export::{ConflictChoice, ConflictPrompt, PendingConflict};

/// Asks for a [`ConflictChoice`] by number or label, one line at a time.
///
/// End of input or a read error counts as Cancel.
pub struct LinePrompt<R> {
    input: Mutex<R>,
}

impl LinePrompt<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LinePrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }

    /// Read lines until one names a choice
    pub async fn read_choice(&self) -> ConflictChoice {
        let mut input = self.input.lock().await;
        loop {
            eprint!("Choice [1-{}]: ", ConflictChoice::ALL.len());

            let mut line = String::new();
            match input.read_line(&mut line).await {
                Ok(0) => {
                    log::warn!("No answer given, cancelling");
                    return ConflictChoice::Cancel;
                }
                Err(e) => {
                    log::warn!("Could not read answer, cancelling: {}", e);
                    return ConflictChoice::Cancel;
                }
                Ok(_) => {}
            }

            if let Some(choice) = parse_answer(&line) {
                return choice;
            }
            eprintln!("Please answer with a number from the list.");
        }
    }
}

#[async_trait]
impl<R> ConflictPrompt for LinePrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn choose(&self, pending: &PendingConflict) -> ConflictChoice {
        eprint!("{}", render_menu(pending.existing_path()));
        self.read_choice().await
    }
}

/// Menu shown before asking
pub fn render_menu(existing: &Path) -> String {
    let mut menu = String::from("File Already Exists\n");
    menu.push_str("Please select how to handle the existing file.\n");
    menu.push_str(&format!("  {}\n", existing.display()));
    for (idx, choice) in ConflictChoice::ALL.iter().enumerate() {
        menu.push_str(&format!("  {}) {}\n", idx + 1, choice.label()));
    }
    menu
}

/// A 1-based menu number, or anything [`ConflictChoice`] parses
pub fn parse_answer(line: &str) -> Option<ConflictChoice> {
    let answer = line.trim();
    if let Ok(n) = answer.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|idx| ConflictChoice::ALL.get(idx).copied());
    }
    answer.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_lists_labels_in_order() {
        let menu = render_menu(Path::new("/site/_posts/2024-01-01-Post.md"));
        assert!(menu.starts_with("File Already Exists\n"));
        assert!(menu.contains("  1) Overwrite Date and Content\n"));
        assert!(menu.contains("  2) Overwrite Content Only\n"));
        assert!(menu.contains("  3) Cancel\n"));
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("1\n"), Some(ConflictChoice::OverwriteAll));
        assert_eq!(parse_answer(" 2 "), Some(ConflictChoice::BodyOnly));
        assert_eq!(parse_answer("cancel"), Some(ConflictChoice::Cancel));
        assert_eq!(parse_answer("0"), None);
        assert_eq!(parse_answer("4"), None);
        assert_eq!(parse_answer("what"), None);
    }

    #[tokio::test]
    async fn test_read_choice_retries() {
        let prompt = LinePrompt::new(&b"nope\n2\n"[..]);
        assert_eq!(prompt.read_choice().await, ConflictChoice::BodyOnly);
    }

    #[tokio::test]
    async fn test_end_of_input_cancels() {
        let prompt = LinePrompt::new(&b""[..]);
        assert_eq!(prompt.read_choice().await, ConflictChoice::Cancel);
    }
}
