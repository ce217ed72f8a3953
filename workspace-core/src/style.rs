use workspace::PanelBorder;

pub const COLUMN_STYLESHEET_ID: &str = "workspace-columns";
pub const BORDER_STYLESHEET_ID: &str = "workspace-panel-border";

fn percent(value: f64) -> String {
    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text}%")
}

/// Width and offset rules for every column index of an `n`-column grid.
pub fn column_stylesheet(columns: u32) -> String {
    let columns = columns.max(1);
    let step = 100.0 / f64::from(columns);
    let mut rules = Vec::with_capacity(columns as usize * 2 + 1);
    rules.push(format!(
        ".grid-stack-{columns} > .grid-stack-item {{ min-width: {}; }}",
        percent(step)
    ));
    for index in 0..=columns {
        let value = percent(step * f64::from(index));
        rules.push(format!(
            ".grid-stack-{columns} > .grid-stack-item[gs-w=\"{index}\"] {{ width: {value}; }}"
        ));
        rules.push(format!(
            ".grid-stack-{columns} > .grid-stack-item[gs-x=\"{index}\"] {{ left: {value}; }}"
        ));
    }
    rules.join("\n")
}

/// Single rule applying the configured border to every panel under `root`.
pub fn panel_border_rule(root: &str, border: &PanelBorder) -> Option<String> {
    if border.is_empty() {
        return None;
    }
    let width = border.width.unwrap_or(1);
    let style = border.style.as_deref().unwrap_or("solid");
    let color = border.color.as_deref().unwrap_or("currentColor");
    Some(format!(
        "{root} .grid-stack-item-content {{ border: {width}px {style} {color}; }}"
    ))
}
