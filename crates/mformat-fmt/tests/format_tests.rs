//! End-to-end formatting scenarios and invariants.

use insta::assert_debug_snapshot;
use mformat_common::settings::Settings;
use mformat_fmt::format_source;

fn format(source: &str) -> String {
    format_source(source, &Settings::default()).expect("source formats")
}

fn assert_format(source: &str, expected: &str) {
    assert_eq!(format(source), expected, "formatting {source:?}");
}

// ── Operator scenarios ──────────────────────────────────────────────────

#[test]
fn operators() {
    let expected = "x = a + (b * (c + d)) + e;\n";
    assert_format("x=a+(b*(c+d))+e;", expected);
    assert_format("x  =  a  +  (  b  *  (  c  +  d  )  )  +  e  ;", expected);
}

#[test]
fn comparison_and_logical_operators() {
    assert_format("r=a<=b&&c~=d;", "r = a <= b && c ~= d;\n");
    assert_format("r=a|b&c;", "r = a | b & c;\n");
}

// ── Block scenarios ─────────────────────────────────────────────────────

#[test]
fn blocks() {
    assert_format("if a;b;end;", "if a\n  b;\nend\n");
    assert_format(
        "if a;b; if c ; d; end;end;",
        "if a\n  b;\n  if c\n    d;\n  end\nend\n",
    );
}

#[test]
fn else_and_elseif_clauses() {
    assert_format(
        "if a\nb;\nelseif c\nd;\nelse\ne;\nend\n",
        "if a\n  b;\nelseif c\n  d;\nelse\n  e;\nend\n",
    );
}

#[test]
fn switch_case_indents_two_levels() {
    assert_format(
        "switch x\ncase 1\na;\notherwise\nb;\nend\n",
        "switch x\n  case 1\n    a;\n  otherwise\n    b;\nend\n",
    );
}

#[test]
fn while_and_try_blocks() {
    assert_format(
        "while x < 10\nx = x + 1;\nend\n",
        "while x < 10\n  x = x + 1;\nend\n",
    );
    assert_format(
        "try\nf();\ncatch\ng();\nend\n",
        "try\n  f();\ncatch\n  g();\nend\n",
    );
}

// ── Function indentation scenarios ──────────────────────────────────────

#[test]
fn functions_with_end() {
    let source = "\
function main
E = m*c*c;

function nested
E = m*c*c;
end
end

function local
E = m*c*c;
end
";
    let expected = "\
function main
E = m * c * c;

function nested
  E = m * c * c;
end
end

function local
E = m * c * c;
end
";
    assert_format(source, expected);
}

#[test]
fn functions_without_end() {
    let source = "\
function main
E = m*c*c;

function local
E = m*c*c;
";
    let expected = "\
function main
E = m * c * c;

function local
E = m * c * c;
";
    assert_format(source, expected);
}

#[test]
fn function_indentation_settings() {
    let source = "function main\na;\nend\n";
    let settings = Settings {
        indent_main_function: true,
        ..Settings::default()
    };
    assert_eq!(
        format_source(source, &settings).unwrap(),
        "function main\n  a;\nend\n"
    );
}

#[test]
fn custom_indent_width() {
    let settings = Settings {
        indent: 4,
        ..Settings::default()
    };
    assert_eq!(
        format_source("if a;b;end;", &settings).unwrap(),
        "if a\n    b;\nend\n"
    );
}

// ── Invariants ──────────────────────────────────────────────────────────

const CORPUS: &[&str] = &[
    "",
    "x=a+(b*(c+d))+e;",
    "if a;b;end;",
    "if a;b; if c ; d; end;end;",
    "for i = 1:10\ndisp(i);\nend\n",
    "switch x\ncase 1\na;\notherwise\nb;\nend\n",
    "function main\nE = m*c*c;\n\nfunction local\nE = m*c*c;\n",
    "a = b + ...\n    c;\n",
    "x = [1, 2; 3, 4];",
    "s = 'it''s';\n% done\n",
    "%{\nblock\n%}\nx = 1;\n",
    "a;\n\n\nb;\n",
];

#[test]
fn formatting_is_idempotent() {
    for source in CORPUS {
        let once = format(source);
        let twice = format(&once);
        assert_eq!(twice, once, "idempotence for {source:?}");
    }
}

#[test]
fn no_output_line_ends_in_a_space() {
    for source in CORPUS {
        let formatted = format(source);
        for line in formatted.lines() {
            assert!(
                !line.ends_with(' '),
                "trailing space in {formatted:?} (from {source:?})"
            );
        }
    }
}

#[test]
fn program_text_is_preserved_up_to_trivia() {
    // Stripping blanks and newlines, the output must carry exactly the
    // input's program text. (Inputs with superfluous block semicolons are
    // exempt: removing those is the point of stage three.)
    fn essence(code: &str) -> String {
        code.chars().filter(|c| !matches!(c, ' ' | '\t' | '\n')).collect()
    }
    for source in ["x=a+(b*(c+d))+e;", "if a\nb;\nend\n", "f(aa,b);\n"] {
        assert_eq!(essence(&format(source)), essence(source), "for {source:?}");
    }
}

#[test]
fn output_ends_with_exactly_one_newline() {
    for source in CORPUS.iter().filter(|s| !s.is_empty()) {
        let formatted = format(source);
        assert!(formatted.ends_with('\n'), "missing newline for {source:?}");
        assert!(
            !formatted.ends_with("\n\n"),
            "doubled final newline for {source:?}"
        );
    }
}

// ── Snapshot ────────────────────────────────────────────────────────────

#[test]
fn nested_program_snapshot() {
    let source = "function y = f(x)\nif x>0;y = x;else;y = -x;end\nend\n";
    assert_debug_snapshot!(
        format(source),
        @r#""function y = f(x)\nif x > 0\n  y = x;\nelse\n  y = -x;\nend\nend\n""#
    );
}
