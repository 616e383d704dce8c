//! Built-in document classes.
//!
//! The generator glue (templating, rostering, grading) builds on a small
//! hierarchy of config-bearing classes. They double as the reference
//! consumers of the lifecycle machinery: every path through preparation,
//! inheritance merging, finalization and instantiation is exercised
//! here.
//!
//! Hierarchy:
//! ```text
//! Document
//!  └── Exam
//!       └── Question
//!            └── MultipleChoice
//! ```

use crate::class::{ClassBuilder, ConfigClass, VarSpec};
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;

/// Root of the hierarchy: everything that ends up as a PDF.
///
/// Declares the two configuration variables the whole framework uses:
/// `settings` (build behavior) and `metadata` (document description).
pub fn document_class() -> Result<Arc<ConfigClass>> {
    let mut builder = ClassBuilder::root(
        "Document",
        vec![
            VarSpec::new(
                "settings",
                "Build-time settings. Subclasses extend these; instances may\n\
                 override any value for a single student's rendition.",
            ),
            VarSpec::new("metadata", "Descriptive metadata embedded in the output."),
        ],
    );

    let settings = builder.var_mut("settings")?;
    let build = settings.new_group("build", "External build pipeline knobs.")?;
    build.new_value(
        "latex_runs",
        json!(2),
        "Number of LaTeX passes.\n        Two passes resolve cross-references.",
    )?;
    build.new_value("keep_tex", json!(false), "Keep intermediate .tex sources.")?;
    let template = settings.new_group("template", "Template lookup.")?;
    template.new_value(
        "search_dirs",
        json!([]),
        "Extra template directories, highest precedence first.",
    )?;
    template.new_value("name", json!("document.tex"), "Main template file name.")?;
    let rng = settings.new_group("rng", "Randomization.")?;
    rng.new_value(
        "seed_offset",
        json!(0),
        "Added to every derived seed; bump to reshuffle all students at once.",
    )?;

    let metadata = builder.var_mut("metadata")?;
    metadata.new_value("title", json!("untitled"), "Document title.")?;
    metadata.new_value("author", json!(""), "Author or course name.")?;
    metadata.new_value("language", json!("en"), "Language code for babel/polyglossia.")?;

    Ok(builder.finalize()?)
}

/// An exam: a document with grading and per-student distribution.
pub fn exam_class(document: &Arc<ConfigClass>) -> Result<Arc<ConfigClass>> {
    let mut builder = ClassBuilder::derive("Exam", &[document])?;

    let settings = builder.var_mut("settings")?;
    let grading = settings.new_group("grading", "Grade computation.")?;
    grading.new_value("max_points", json!(100), "Points for a perfect exam.")?;
    grading.new_value(
        "pass_fraction",
        json!(0.5),
        "Fraction of max_points required to pass.",
    )?;
    grading.new_value(
        "round_to",
        json!(0.5),
        "Grades are rounded to multiples of this step.",
    )?;
    settings.new_value("solutions", json!(false), "Also build solution documents.")?;
    settings.child_mut("template")?.set("name", json!("exam.tex"))?;

    builder
        .var_mut("metadata")?
        .new_value("term", json!(""), "Term or semester label.")?;

    Ok(builder.finalize()?)
}

/// A single question inside an exam.
pub fn question_class(exam: &Arc<ConfigClass>) -> Result<Arc<ConfigClass>> {
    let mut builder = ClassBuilder::derive("Question", &[exam])?;

    let settings = builder.var_mut("settings")?;
    settings.new_value("points", json!(1), "Points awarded for a full answer.")?;
    settings.new_value(
        "bonus",
        json!(false),
        "Bonus questions add points without raising max_points.",
    )?;
    settings
        .child_mut("template")?
        .set("name", json!("question.tex"))?;

    Ok(builder.finalize()?)
}

/// A multiple-choice question with shuffled answer order.
pub fn multiple_choice_class(question: &Arc<ConfigClass>) -> Result<Arc<ConfigClass>> {
    let mut builder = ClassBuilder::derive("MultipleChoice", &[question])?;

    let settings = builder.var_mut("settings")?;
    let choices = settings.new_group("choices", "Answer choice handling.")?;
    choices.new_value("shuffle", json!(true), "Shuffle choices per student.")?;
    choices.new_value(
        "count",
        json!(4),
        "Choices shown per question, including the correct one.",
    )?;

    Ok(builder.finalize()?)
}

/// The full built-in hierarchy, base class first.
pub fn builtin_classes() -> Result<Vec<Arc<ConfigClass>>> {
    let document = document_class()?;
    let exam = exam_class(&document)?;
    let question = question_class(&exam)?;
    let multiple_choice = multiple_choice_class(&question)?;
    Ok(vec![document, exam, question, multiple_choice])
}

/// Look up a built-in class by name, case-insensitive.
pub fn builtin_class(name: &str) -> Result<Option<Arc<ConfigClass>>> {
    let wanted = name.to_lowercase();
    Ok(builtin_classes()?
        .into_iter()
        .find(|class| class.name().to_lowercase() == wanted))
}
