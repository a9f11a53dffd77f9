//! Benchmarks for the highlighting pass and smart editing.
//!
//! Every keystroke re-runs every rule over the whole document, so the cost
//! of one pass grows with document length.
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use syntaxkit_buffer::StyledBuffer;
use syntaxkit_core::SyntaxEditor;
use syntaxkit_syntax::{Grammar, Highlighter, ThemeStore};

/// Generates a Swift-looking document with `lines` lines.
fn generate_source(lines: usize) -> String {
    (0..lines)
        .map(|i| match i % 4 {
            0 => format!("func handler{i}(value: Int) -> String {{\n"),
            1 => format!("    let name = \"item \\(value)\" // line {i}\n"),
            2 => format!("    return format(<#name#>, {i})\n"),
            _ => "}\n".to_string(),
        })
        .collect()
}

/// Benchmarks one full pass over growing documents.
fn bench_highlight_pass(c: &mut Criterion) {
    let store = ThemeStore::in_memory();
    let grammar = Grammar::builtin("swift", &store).unwrap();
    let highlighter = Highlighter::new(store);

    let mut group = c.benchmark_group("highlight_pass");
    for size in [100, 1000, 10000].iter() {
        let text = generate_source(*size);

        group.bench_with_input(BenchmarkId::new("swift", size), &text, |b, text| {
            b.iter_with_setup(
                || StyledBuffer::from(text.as_str()),
                |mut buffer| {
                    highlighter.highlight(&mut buffer, black_box(&grammar));
                    black_box(buffer)
                },
            )
        });
    }

    group.finish();
}

/// Benchmarks typing a block, which repaints after every keystroke.
fn bench_typing(c: &mut Criterion) {
    let store = ThemeStore::in_memory();
    let grammar = Grammar::builtin("swift", &store).unwrap();
    let base = generate_source(1000);

    c.bench_function("type_block_in_1000_lines", |b| {
        b.iter_with_setup(
            || {
                let mut editor = SyntaxEditor::new(grammar.clone(), store.clone());
                editor.set_text(&base);
                editor
            },
            |mut editor| {
                editor.type_text(black_box("if ready {\nrun()")).unwrap();
                black_box(editor)
            },
        )
    });
}

criterion_group!(benches, bench_highlight_pass, bench_typing);
criterion_main!(benches);
