//! Usage-text layout.
//!
//! Assembles the program line, summaries, and per-option table from the
//! compiled descriptor set. Usage never requires a parse to have occurred;
//! rendered doc text goes through the ASCII assertion, so authoring mistakes
//! in static doc strings surface here.

use std::io::{self, Write};

use optbind_core::{Cardinality, DescriptorSet, OptionsRecord, ValueKind, markup};

pub(crate) fn render(
    record: &OptionsRecord,
    model: &DescriptorSet,
    out: &mut dyn Write,
    detailed: bool,
) -> io::Result<()> {
    let mut usage_line = format!("USAGE: {} [options]", record.program_name());
    if let Some(positional) = model.positional() {
        usage_line.push(' ');
        usage_line.push_str(&positional.name);
    }
    writeln!(out, "{usage_line}")?;
    writeln!(out)?;

    let one_line = markup::render_summary(record.one_line_summary());
    markup::assert_plain_ascii("one-line summary", &one_line);
    if !one_line.is_empty() {
        writeln!(out, "{one_line}")?;
    }
    if detailed && !record.summary().is_empty() {
        let summary = markup::render_doc(record.summary());
        markup::assert_plain_ascii("summary", &summary);
        writeln!(out)?;
        writeln!(out, "{summary}")?;
    }

    if let Some(positional) = model.positional() {
        let doc = markup::render_doc(&positional.doc);
        markup::assert_plain_ascii(&positional.name, &doc);
        writeln!(out)?;
        writeln!(out, "{} <{}>", positional.name, positional.kind)?;
        let mut notes = Vec::new();
        if !doc.is_empty() {
            notes.push(doc);
        }
        notes.push(format!(
            "May be supplied {}.",
            describe(positional.cardinality)
        ));
        writeln!(out, "    {}", notes.join("  "))?;
    }

    writeln!(out)?;
    writeln!(out, "Options:")?;
    for descriptor in model.descriptors() {
        writeln!(out)?;
        writeln!(out, "{}=<{}>", descriptor.name, descriptor.kind)?;
        if descriptor.short_alias != descriptor.name {
            writeln!(out, "{}=<{}>", descriptor.short_alias, descriptor.kind)?;
        }

        let doc = markup::render_doc(&descriptor.doc);
        markup::assert_plain_ascii(&descriptor.name, &doc);
        let mut notes = Vec::new();
        if !doc.is_empty() {
            notes.push(doc);
        }
        if let ValueKind::Choice(choices) = &descriptor.kind {
            notes.push(format!("Legal values: {}.", choices.join(", ")));
        }
        if let Some(default) = &descriptor.default_display {
            notes.push(format!("Default value: {default}."));
        }
        if descriptor.required && descriptor.mutex_peers.is_empty() && !descriptor.is_collection()
        {
            notes.push("Required.".to_string());
        }
        if let Some(cardinality) = descriptor.cardinality {
            notes.push(format!("May be specified {}.", describe(cardinality)));
        }
        if !descriptor.mutex_peers.is_empty() {
            notes.push(format!(
                "Cannot be used in conjunction with option(s): {}.",
                descriptor.mutex_peers.join(", ")
            ));
        }
        if !notes.is_empty() {
            writeln!(out, "    {}", notes.join("  "))?;
        }
    }
    Ok(())
}

fn describe(cardinality: Cardinality) -> String {
    match cardinality.max {
        Some(max) if cardinality.min == max => format!("exactly {max} times"),
        Some(max) => format!("between {} and {max} times", cardinality.min),
        None => format!("at least {} times", cardinality.min),
    }
}
