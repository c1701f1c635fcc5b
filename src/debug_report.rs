use tokalign::{Alignment, Boundary, MENTION_TYPE_ATTRIBUTE};

/// ANSI styling keyed by what a piece of the report means.
mod style {
    const RESET: &str = "\x1b[0m";

    #[derive(Debug, Clone, Copy)]
    pub enum Role {
        Title,
        Rule,
        Offsets,
        Label,
        Raw,
        Accepted,
        Rejected,
        Muted,
    }

    impl Role {
        fn code(self) -> &'static str {
            match self {
                Role::Title => "\x1b[1;36m",
                Role::Rule => "\x1b[90m",
                Role::Offsets => "\x1b[33m",
                Role::Label => "\x1b[1;32m",
                Role::Raw => "\x1b[34m",
                Role::Accepted => "\x1b[32m",
                Role::Rejected => "\x1b[31m",
                Role::Muted => "\x1b[2m",
            }
        }
    }

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, role: Role) -> String {
            if self.enabled { format!("{}{}{RESET}", role.code(), s.as_ref()) } else { s.as_ref().to_string() }
        }

        /// Section heading, e.g. `━━━ Spans ━━━`.
        pub fn section(&self, title: &str) -> String {
            self.paint(format!("━━━ {title} ━━━"), Role::Rule)
        }
    }
}

use style::{Palette, Role};

pub fn print_run(input: &str, tokens: &[(usize, usize)], out: &Alignment, color: bool) {
    let palette = Palette::new(color);
    println!(
        "\n{}",
        palette.paint(format!("⚙  Aligning {} tokens into {}", tokens.len(), out.layer.name()), Role::Title)
    );

    println!("\n{}", palette.section("Tokens"));
    print_tokens(input, tokens, &palette);

    println!("\n{}", palette.section("Spans"));
    if out.layer.is_empty() {
        println!("{}", palette.paint("  No spans accepted", Role::Muted));
    } else {
        for span in out.layer.sorted() {
            println!(
                "  {} {} {} {}",
                palette.paint(format!("{}..{}", span.start, span.end), Role::Offsets),
                palette.paint(&span.label, Role::Label),
                palette.paint(format!("│ {}={}", MENTION_TYPE_ATTRIBUTE, span.kind), Role::Muted),
                covered_text(input, tokens, span.start, span.end),
            );
        }
    }

    if !out.reports.is_empty() {
        println!("\n{}", palette.section("Offset errors"));
        for report in &out.reports {
            let side = match report.boundary {
                Boundary::Start => "start",
                Boundary::End => "end",
            };
            let outcome = match report.fallback {
                Some(range) => palette.paint(format!("→ tokens {range}"), Role::Offsets),
                None => palette.paint("dropped", Role::Rejected),
            };
            println!(
                "  {} {} {} {}",
                palette.paint(format!("{}..{}", report.offset, report.end), Role::Offsets),
                palette.paint(format!("'{}'", report.raw), Role::Raw),
                palette.paint(format!("│ {side} not exact"), Role::Muted),
                outcome
            );
            if let Some(surface) = &report.surface {
                println!("      {} {}", palette.paint("annotated:", Role::Muted), surface);
            }
            if !report.window.is_empty() {
                println!("      {} {}", palette.paint("window:", Role::Muted), report.window);
            }
        }
    }

    if !out.conflicts.is_empty() {
        println!("\n{}", palette.section("Overlaps"));
        for conflict in &out.conflicts {
            println!(
                "  {} {} {}",
                palette.paint(conflict.candidate.to_string(), Role::Rejected),
                palette.paint("│ blocked by", Role::Muted),
                palette.paint(conflict.existing.to_string(), Role::Accepted)
            );
        }
    }

    let d = &out.diagnostics;
    println!("\n{}", palette.section("Counts"));
    println!(
        "  Accepted: {}  │  Overlaps: {}  │  Offset errors: {}  │  Dropped: {}  │  Skipped: {}",
        palette.paint(d.accepted.to_string(), Role::Accepted),
        palette.paint(d.rejected_overlap.to_string(), Role::Offsets),
        palette.paint(d.offset_errors.to_string(), Role::Offsets),
        palette.paint(d.dropped.to_string(), Role::Rejected),
        palette.paint(d.skipped.to_string(), Role::Muted),
    );
    println!("  Elapsed: {}", palette.paint(format!("{:?}", out.elapsed), Role::Muted));
    println!();
}

fn print_tokens(input: &str, tokens: &[(usize, usize)], palette: &Palette) {
    let line = tokens
        .iter()
        .enumerate()
        .map(|(idx, &(start, end))| {
            format!("{}{}", palette.paint(format!("{idx}:"), Role::Rule), input.get(start..end).unwrap_or(""))
        })
        .collect::<Vec<_>>()
        .join(" ");
    println!("  {line}");
}

fn covered_text(input: &str, tokens: &[(usize, usize)], start: usize, end: usize) -> String {
    let from = tokens.get(start).map(|t| t.0);
    let to = end.checked_sub(1).and_then(|last| tokens.get(last)).map(|t| t.1);
    match (from, to) {
        (Some(from), Some(to)) => input.get(from..to).unwrap_or("").to_string(),
        _ => String::new(),
    }
}
