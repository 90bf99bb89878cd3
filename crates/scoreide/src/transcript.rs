use serde::Serialize;

/// One recorded exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    /// A rendered menu.
    Menu { title: String, lines: Vec<String> },
    /// Lines shown to the user.
    Display { lines: Vec<String> },
    /// A prompt and what was entered at it.
    Input { prompt: String, response: String },
}

impl Entry {
    pub fn lines(&self) -> Vec<String> {
        match self {
            Entry::Menu { lines, .. } | Entry::Display { lines } => lines.clone(),
            Entry::Input { prompt, response } => vec![format!("{}> {}", prompt, response)],
        }
    }
}

/// Append-only log of everything displayed and entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_menu(&mut self, title: &str, lines: &[String]) {
        self.entries.push(Entry::Menu {
            title: title.to_string(),
            lines: lines.to_vec(),
        });
    }

    pub fn record_display(&mut self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        self.entries.push(Entry::Display {
            lines: lines.to_vec(),
        });
    }

    pub fn record_input(&mut self, prompt: &str, response: &str) {
        self.entries.push(Entry::Input {
            prompt: prompt.to_string(),
            response: response.to_string(),
        });
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Titles of every rendered menu, in order.
    pub fn titles(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::Menu { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every line in order, menus included.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().flat_map(Entry::lines).collect()
    }

    /// True when some recorded line equals `line` exactly.
    pub fn contains(&self, line: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.lines().iter().any(|l| l == line))
    }

    /// True when some recorded line contains `text`.
    pub fn contains_text(&self, text: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.lines().iter().any(|l| l.contains(text)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles_and_lines() {
        let mut t = Transcript::new();
        t.record_menu("scores", &["scores".into(), "   1: Red Score".into()]);
        t.record_input("", "red");
        t.record_display(&["Writing x ...".into()]);
        t.record_input("Commit message", "Updated.");

        assert_eq!(t.titles(), vec!["scores".to_string()]);
        assert!(t.contains("> red"));
        assert!(t.contains("Commit message> Updated."));
        assert!(t.contains_text("Writing"));
        assert!(!t.contains("Writing"));
        assert_eq!(t.lines().len(), 5);
    }

    #[test]
    fn test_empty_display_not_recorded() {
        let mut t = Transcript::new();
        t.record_display(&[]);
        assert!(t.is_empty());
    }

    #[test]
    fn test_json_tags_kind() {
        let mut t = Transcript::new();
        t.record_input("", "q");
        let json = t.to_json_pretty().unwrap();
        assert!(json.contains("\"kind\": \"input\""));
    }
}
