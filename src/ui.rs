use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use console::style;

const HEADER_WIDTH: usize = 74;

pub fn render_header() {
    let border = "─".repeat(HEADER_WIDTH - 2);
    println!("\n{}", style(format!("┌{}┐", border)).cyan());
    println!(
        "{}",
        style(format!(
            "│ {:^inner_width$} │",
            "▸ Metascope · Extractor Forense de Metadata ◂",
            inner_width = HEADER_WIDTH - 4
        ))
        .cyan()
        .bold()
    );
    println!("{}\n", style(format!("└{}┘", border)).cyan());
}

/// Imprime el título de una sección, p. ej. el nombre de un espacio de
/// nombres.
pub fn render_section_title(title: &str) {
    println!("\n{} {}", style("▸").cyan(), style(title).cyan().bold());
}

/// Tabla con el estilo común de la herramienta. Sin color se fuerza el modo
/// sin TTY para que comfy-table no emita secuencias de escape.
pub fn base_table(color: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if !color {
        table.force_no_tty();
    }
    table
}

pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
        .add_attribute(Attribute::Underlined)
}

pub fn label_cell(text: &str) -> Cell {
    Cell::new(text).fg(Color::Rgb {
        r: 160,
        g: 196,
        b: 255,
    })
}
