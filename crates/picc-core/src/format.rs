//! Display formatting for snake_case classification keys.

/// `"mens_health"` → `"Mens Health"`.
pub fn format_category_name(category: &str) -> String { title_case_words(category) }

/// `"elder_wisdom"` → `"Elder Wisdom"`.
pub fn format_story_type(story_type: &str) -> String { title_case_words(story_type) }

/// Split on `_`, upper-case the first character of each word, join with
/// spaces. The rest of each word is left untouched.
fn title_case_words(s: &str) -> String {
  s.split('_').map(capitalize).collect::<Vec<_>>().join(" ")
}

fn capitalize(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}
