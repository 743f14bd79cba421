use crate::session::{Notice, SessionState};
use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

const PAGE_TEMPLATE: &str = "page";

#[derive(Serialize)]
struct PageView<'a> {
    dark_mode: bool,
    notices: &'a [Notice],
    goal: Option<&'a str>,
    dataset: Option<DatasetView<'a>>,
    reflections: Vec<ReflectionView<'a>>,
    tags: &'a [String],
    quote: &'a str,
}

#[derive(Serialize)]
struct DatasetView<'a> {
    file_name: &'a str,
    headers: Vec<&'a str>,
    rows: Vec<Vec<String>>,
    chart_enabled: bool,
    x_options: Vec<OptionView<'a>>,
    y_options: Vec<OptionView<'a>>,
}

#[derive(Serialize)]
struct OptionView<'a> {
    name: &'a str,
    selected: bool,
}

#[derive(Serialize)]
struct ReflectionView<'a> {
    number: usize,
    text: &'a str,
}

/// Renders the single page of the app from a session's state
pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    /// Compile the embedded page template
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_template_string(PAGE_TEMPLATE, include_str!("./static/index.html"))?;
        Ok(Self { registry })
    }

    /// Render the whole page
    ///
    /// # Arguments
    /// * `state` - Session to render
    /// * `notices` - Messages drained from the session for this render
    /// * `quote` - Inspiration quote picked for this render
    ///
    /// # Returns
    /// * `Result<String, RenderError>` - The HTML document or an error
    pub fn page(
        &self,
        state: &SessionState,
        notices: &[Notice],
        quote: &str,
    ) -> Result<String, RenderError> {
        let view = PageView {
            dark_mode: state.dark_mode,
            notices,
            goal: state.goal.as_deref(),
            dataset: dataset_view(state),
            reflections: state
                .reflections
                .iter()
                .enumerate()
                .map(|(i, text)| ReflectionView {
                    number: i + 1,
                    text,
                })
                .collect(),
            tags: &state.tags,
            quote,
        };

        self.registry.render(PAGE_TEMPLATE, &view)
    }
}

fn dataset_view(state: &SessionState) -> Option<DatasetView<'_>> {
    let dataset = state.dataset.as_ref()?;
    let table = &dataset.table;
    let numeric = table.numeric_columns();

    let (x, y) = match &state.chart {
        Some(selection) => (selection.x.as_str(), selection.y.as_str()),
        None => ("", ""),
    };

    Some(DatasetView {
        file_name: &dataset.file_name,
        headers: table.column_names(),
        rows: table
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
        chart_enabled: !numeric.is_empty(),
        x_options: options(&numeric, x),
        y_options: options(&numeric, y),
    })
}

fn options<'a>(numeric: &[&'a str], selected: &str) -> Vec<OptionView<'a>> {
    numeric
        .iter()
        .map(|&name| OptionView {
            name,
            selected: name == selected,
        })
        .collect()
}
