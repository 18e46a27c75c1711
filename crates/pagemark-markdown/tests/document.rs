use pagemark_core::theme::Theme;
use pagemark_markdown::ColumnFlow;
use pagemark_markdown::MarkdownDocument;
use pagemark_markdown::RenderOptions;
use ratatui::text::Line;

const SAMPLE: &str = include_str!("../../pagemark/src/sample.md");

fn plain(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

#[test]
fn default_document_renders_all_of_its_math() {
    let doc = MarkdownDocument::parse(SAMPLE, &RenderOptions::default());
    assert_eq!(doc.math_errors(), 0);

    let lines: Vec<String> = doc.render(60, &Theme::default()).iter().map(plain).collect();
    assert_eq!(lines[0], "3.5 | STATISTICAL MECHANICS");
    assert!(
        lines
            .iter()
            .any(|l| l == "  f_F(E) = 1/(1 + exp((E − E_F)/kT)) (3.79)"),
        "Fermi-Dirac function missing"
    );
    assert!(lines.iter().all(|l| !l.contains('$')));
}

#[test]
fn prose_never_exceeds_the_column_width() {
    let doc = MarkdownDocument::parse(SAMPLE, &RenderOptions::default());
    for width in [30u16, 50, 80] {
        for line in doc.render(width, &Theme::default()) {
            assert!(
                line.width() <= width as usize,
                "{width}: {:?} is {} wide",
                plain(&line),
                line.width()
            );
        }
    }
}

#[test]
fn flowing_keeps_every_line_in_reading_order() {
    let doc = MarkdownDocument::parse(SAMPLE, &RenderOptions::default());
    let lines = doc.render(37, &Theme::default());
    let expected: Vec<String> = lines
        .iter()
        .map(plain)
        .filter(|l| !l.trim().is_empty())
        .collect();

    let flow = ColumnFlow::new(lines, 19);
    assert!(flow.len() > 4);
    let mut seen: Vec<String> = Vec::new();
    for column in flow.iter() {
        assert!(column.len() <= 19);
        assert!(!plain(&column[0]).trim().is_empty());
        seen.extend(column.iter().map(plain).filter(|l| !l.trim().is_empty()));
    }
    assert_eq!(seen, expected);
}

#[test]
fn edits_that_break_math_only_affect_that_span() {
    let broken = SAMPLE.replacen("\\frac{1}{1 + ", "\\frac{1}{1 + {", 1);
    let doc = MarkdownDocument::parse(&broken, &RenderOptions::default());
    assert_eq!(doc.math_errors(), 1);
    let lines: Vec<String> = doc.render(80, &Theme::default()).iter().map(plain).collect();
    assert!(lines.iter().any(|l| l.trim_start().starts_with("⚠ f_F(E)")));
    assert!(lines.iter().any(|l| l.contains("Boltzmann's constant")));
}

#[test]
fn deeply_nested_math_degrades_to_a_marker() {
    let depth = 50_000;
    let source = format!("before ${}x{}$ after", "{".repeat(depth), "}".repeat(depth));
    let doc = MarkdownDocument::parse(&source, &RenderOptions::default());
    assert_eq!(doc.math_errors(), 1);
    let text: String = doc
        .render(80, &Theme::default())
        .iter()
        .map(plain)
        .collect();
    assert!(text.starts_with("before"));
    assert!(text.contains("⚠ {{{"));
    assert!(text.trim_end().ends_with("after"));
}
