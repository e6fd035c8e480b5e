//! What the search box shows, derived purely from [`SearchState`].

use std::fmt;

use crate::state::{Mode, SearchState};

pub const PLACEHOLDER: &str = "Buscar cidade...";
pub const LOADING_TEXT: &str = "Buscando cidades...";
pub const CLEAR_LABEL: &str = "Limpar";

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionRow {
    pub key: String,
    pub name: String,
    pub label: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub input_value: String,
    pub placeholder: &'static str,
    /// Clear control label; present while the field has text
    pub clear_button: Option<&'static str>,
    /// Rows; present while the dropdown is open and has suggestions
    pub dropdown: Option<Vec<SuggestionRow>>,
    pub loading: Option<&'static str>,
    pub error: Option<String>,
}

pub fn render(state: &SearchState) -> View {
    let showing = state.dropdown_open() && !state.suggestions().is_empty();
    let dropdown: Option<Vec<SuggestionRow>> = showing.then(|| {
        state
            .suggestions()
            .iter()
            .enumerate()
            .map(|(i, city)| SuggestionRow {
                key: city.key(),
                name: city.name.clone(),
                label: city.label.clone(),
                highlighted: state.highlighted_index() == Some(i),
            })
            .collect()
    });

    View {
        input_value: state.input_text().to_string(),
        placeholder: PLACEHOLDER,
        clear_button: (!state.input_text().is_empty()).then_some(CLEAR_LABEL),
        dropdown,
        loading: (state.mode() == Mode::SuggestionsLoading).then_some(LOADING_TEXT),
        error: state.error().map(|e| e.message.clone()),
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.input_value.is_empty() {
            write!(f, "[ {} ]", self.placeholder)?;
        } else {
            write!(f, "[ {} ]", self.input_value)?;
        }
        if let Some(label) = self.clear_button {
            write!(f, " ({})", label)?;
        }
        writeln!(f)?;

        if let Some(rows) = &self.dropdown {
            for (i, row) in rows.iter().enumerate() {
                let marker = if row.highlighted { '>' } else { ' ' };
                writeln!(f, " {} {}. {} | {}", marker, i, row.name, row.label)?;
            }
        }
        if let Some(text) = self.loading {
            writeln!(f, "   {}", text)?;
        }
        if let Some(error) = &self.error {
            writeln!(f, " ! {}", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Event, InputSource};
    use crate::testing::city;

    fn typed(text: &str) -> SearchState {
        SearchState::default().reduce(Event::InputChanged {
            text: text.into(),
            source: InputSource::User,
        })
    }

    #[test]
    fn empty_field() {
        let view = render(&SearchState::default());
        assert_eq!(view.placeholder, "Buscar cidade...");
        assert_eq!(view.clear_button, None);
        assert_eq!(view.dropdown, None);
        assert_eq!(view.loading, None);
        assert!(view.to_string().contains("Buscar cidade..."));
    }

    #[test]
    fn clear_button_follows_text() {
        assert_eq!(render(&typed("S")).clear_button, Some("Limpar"));
    }

    #[test]
    fn loading_indicator() {
        let s = typed("Sa").reduce(Event::SuggestionsRequested { request_id: 1 });
        let view = render(&s);
        assert_eq!(view.loading, Some("Buscando cidades..."));
        assert!(view.to_string().contains("Buscando cidades..."));
    }

    #[test]
    fn rows_with_highlight() {
        let s = typed("Sa")
            .reduce(Event::SuggestionsRequested { request_id: 1 })
            .reduce(Event::SuggestionsSucceeded {
                request_id: 1,
                suggestions: vec![city("Santos"), city("Sorocaba")],
            })
            .reduce(Event::HighlightNext);
        let rows = render(&s).dropdown.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].highlighted);
        assert!(rows[1].highlighted);
        assert_eq!(rows[1].name, "Sorocaba");
        assert_eq!(rows[1].key, city("Sorocaba").key());
    }

    #[test]
    fn closed_dropdown_hides_rows() {
        let s = typed("Sa")
            .reduce(Event::SuggestionsRequested { request_id: 1 })
            .reduce(Event::SuggestionsSucceeded {
                request_id: 1,
                suggestions: vec![city("Santos")],
            })
            .reduce(Event::DropdownClose);
        assert_eq!(render(&s).dropdown, None);
    }

    #[test]
    fn error_is_shown() {
        let s = typed("Sa")
            .reduce(Event::SuggestionsRequested { request_id: 1 })
            .reduce(Event::SuggestionsFailed {
                request_id: 1,
                message: "Falha ao buscar sugestões".into(),
            });
        let view = render(&s);
        assert_eq!(view.error.as_deref(), Some("Falha ao buscar sugestões"));
        assert!(view.to_string().contains("Falha ao buscar sugestões"));
    }
}
