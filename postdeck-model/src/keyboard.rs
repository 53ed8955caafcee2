/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value"))]
pub enum ButtonTarget {
    /// Opens an external link.
    Link(String),
    /// Sends an action token back to the bot.
    Callback(String),
    /// Informational, disabled button.
    Marker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ButtonSpec {
    pub label: String,
    pub target: ButtonTarget,
}

impl ButtonSpec {
    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Link(url.into()),
        }
    }

    pub fn callback(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Callback(token.into()),
        }
    }

    pub fn marker(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Marker,
        }
    }

    pub fn is_interactive(&self) -> bool {
        !matches!(self.target, ButtonTarget::Marker)
    }
}

/// Ordered rows of buttons attached to a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyboardLayout {
    rows: Vec<Vec<ButtonSpec>>,
}

impl KeyboardLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Vec<ButtonSpec>>) -> Self {
        let rows = rows.into_iter().filter(|row| !row.is_empty()).collect();
        Self { rows }
    }

    /// One button per row.
    pub fn single_column(buttons: impl IntoIterator<Item = ButtonSpec>) -> Self {
        Self {
            rows: buttons.into_iter().map(|button| vec![button]).collect(),
        }
    }

    pub fn push_row(&mut self, row: Vec<ButtonSpec>) {
        if !row.is_empty() {
            self.rows.push(row);
        }
    }

    pub fn rows(&self) -> &[Vec<ButtonSpec>] {
        &self.rows
    }

    pub fn last_row_mut(&mut self) -> Option<&mut Vec<ButtonSpec>> {
        self.rows.last_mut()
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut Vec<ButtonSpec>> {
        self.rows.get_mut(index)
    }

    /// Insert `row` before `index`, clamped to the end.
    pub fn insert_row(&mut self, index: usize, row: Vec<ButtonSpec>) {
        if !row.is_empty() {
            let index = index.min(self.rows.len());
            self.rows.insert(index, row);
        }
    }

    pub fn button_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn buttons(&self) -> impl Iterator<Item = &ButtonSpec> {
        self.rows.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rows_are_never_stored() {
        let mut layout = KeyboardLayout::new();
        layout.push_row(Vec::new());
        layout.push_row(vec![ButtonSpec::marker("Ep 1")]);
        assert_eq!(layout.rows().len(), 1);

        let layout = KeyboardLayout::from_rows(vec![vec![], vec![ButtonSpec::marker("x")]]);
        assert_eq!(layout.rows().len(), 1);
    }

    #[test]
    fn button_count_spans_all_rows() {
        let layout = KeyboardLayout::from_rows(vec![
            vec![ButtonSpec::link("480p", "https://a")],
            vec![
                ButtonSpec::marker("Ep 1"),
                ButtonSpec::link("720p", "https://b"),
            ],
        ]);
        assert_eq!(layout.button_count(), 3);
        assert_eq!(layout.buttons().filter(|b| b.is_interactive()).count(), 2);
    }
}
