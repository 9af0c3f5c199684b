//! Quotation-aware argument tokenizer. Splits on whitespace, then re-merges
//! runs of tokens between an opening and a closing `"` into one token with
//! the quotes stripped and inner whitespace collapsed to single spaces.

/// Tokenize a command's argument text.
///
/// A token carrying two `"` characters is a self-contained phrase and closes
/// immediately. An unterminated quote consumes everything to the end of the
/// input as one phrase — a deliberate quirk, not an error.
pub fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut phrase = String::new();
    let mut in_phrase = false;

    for token in raw.split_whitespace() {
        if token.contains('"') {
            push_word(&mut phrase, token.trim_matches('"'));
            if in_phrase || token.matches('"').count() == 2 {
                tokens.push(std::mem::take(&mut phrase));
                in_phrase = false;
            } else {
                in_phrase = true;
            }
        } else if in_phrase {
            push_word(&mut phrase, token);
        } else {
            tokens.push(token.to_string());
        }
    }

    if in_phrase {
        tokens.push(phrase);
    }

    tokens
}

fn push_word(phrase: &mut String, word: &str) {
    if !phrase.is_empty() && !word.is_empty() {
        phrase.push(' ');
    }
    phrase.push_str(word);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_phrase_merges() {
        assert_eq!(
            tokenize("\"Overwatch Night\" yes"),
            vec!["Overwatch Night", "yes"]
        );
    }

    #[test]
    fn test_plain_tokens_pass_through() {
        assert_eq!(
            tokenize("Game 2017-06-01 05:30PM PST"),
            vec!["Game", "2017-06-01", "05:30PM", "PST"]
        );
    }

    #[test]
    fn test_self_contained_phrase_closes_immediately() {
        assert_eq!(tokenize("\"solo\" yes"), vec!["solo", "yes"]);
    }

    #[test]
    fn test_long_phrase_collapses_inner_whitespace() {
        assert_eq!(
            tokenize("\"bring   your   own    beer\" maybe"),
            vec!["bring your own beer", "maybe"]
        );
    }

    #[test]
    fn test_two_phrases() {
        assert_eq!(
            tokenize("\"Game Night\" 2017-06-01 05:30PM PST \"Bring your own beer.\""),
            vec![
                "Game Night",
                "2017-06-01",
                "05:30PM",
                "PST",
                "Bring your own beer."
            ]
        );
    }

    #[test]
    fn test_unterminated_quote_consumes_rest() {
        assert_eq!(
            tokenize("\"Game Night 2017-06-01 tonight"),
            vec!["Game Night 2017-06-01 tonight"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }
}
