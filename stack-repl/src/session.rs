//! The state of an interactive session, and the commands that change it.

use crate::error::Error;
use stack_filter::{
    FilterContext,
    FilterRegistry,
    FilterSettings,
    Pipeline,
    SecurityPolicy,
    StringTable,
};
use stack_parser::{ast::Ast, parse, util::csv_to_vec};
use stack_prt::{EvaluationResult, Prt, PrtEvaluator, Responses, StackOptions};
use std::{fmt::Write, fs};
use tracing::info;

const HELP: &str = "\
<expr>                    parse and filter an expression with the current pipeline
:filters <name>, ...      choose the filters of the pipeline (core filters are always included)
:set <filter> <json>      give settings to a parametric filter
:allow <word>, ...        set the allowed words
:forbid <word>, ...       set the forbidden words
:option <name> <value>    set a question option
:load <file>              load a potential response tree from JSON
:ans <input> <expr>       set a student response, checked by the pipeline
:ta <input> <expr>        set a teacher response
:nodes                    list the nodes of the loaded tree
:eval                     evaluate the loaded tree against the responses
:help                     show this message";

/// An interactive session: a filter pipeline, a policy, and optionally a tree with responses to
/// evaluate it against.
pub struct Session {
    registry: FilterRegistry,
    filters: Vec<String>,
    settings: FilterSettings,
    pipeline: Pipeline,
    security: SecurityPolicy,
    translator: StringTable,
    options: StackOptions,
    prt: Option<Prt>,
    student: Responses,
    teacher: Responses,
}

impl Session {
    /// Creates a session whose pipeline holds only the core filters.
    pub fn new() -> Result<Self, Error> {
        let registry = FilterRegistry::new();
        let settings = FilterSettings::new();
        let pipeline = registry.build_pipeline(&[], &settings, true)?;
        Ok(Self {
            registry,
            filters: Vec::new(),
            settings,
            pipeline,
            security: SecurityPolicy::new(),
            translator: StringTable::english(),
            options: StackOptions::default(),
            prt: None,
            student: Responses::new(),
            teacher: Responses::new(),
        })
    }

    /// Runs one line of input, returning the text to show.
    pub fn handle(&mut self, line: &str) -> Result<String, Error> {
        let line = line.trim();
        let Some(command) = line.strip_prefix(':') else {
            let (_, text) = self.check(line);
            return Ok(text);
        };

        let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
        let rest = rest.trim();
        match name {
            "help" => Ok(HELP.to_string()),
            "filters" => {
                let previous = std::mem::replace(&mut self.filters, csv_to_vec(rest));
                if let Err(err) = self.rebuild() {
                    self.filters = previous;
                    return Err(err);
                }
                Ok(self.pipeline.names().join("\n"))
            },
            "set" => {
                let (filter, json) = rest.split_once(char::is_whitespace)
                    .ok_or(Error::Usage(":set <filter> <json>"))?;
                self.settings.insert(filter, serde_json::from_str(json.trim())?);
                self.rebuild()?;
                Ok(format!("settings for `{}` updated", filter))
            },
            "allow" => {
                self.security.set_allowed_words(csv_to_vec(rest));
                Ok(format!("{} allowed word(s)", self.security.allowed_words().len()))
            },
            "forbid" => {
                self.security.set_forbidden_words(csv_to_vec(rest));
                Ok(format!("{} forbidden word(s)", self.security.forbidden_words().len()))
            },
            "option" => {
                let (option, value) = rest.split_once(char::is_whitespace)
                    .ok_or(Error::Usage(":option <name> <value>"))?;
                self.options.set(option, value)?;
                Ok(format!("{} = {}", option, value.trim()))
            },
            "load" => {
                if rest.is_empty() {
                    return Err(Error::Usage(":load <file>"));
                }
                let json = fs::read_to_string(rest)
                    .map_err(|source| Error::Io { path: rest.to_string(), source })?;
                let prt = Prt::from_json(&json)?;
                let text = format!("loaded `{}` with {} node(s)", prt.name(), prt.nodes().len());
                self.prt = Some(prt);
                Ok(text)
            },
            "ans" | "ta" => {
                let (input, source) = rest.split_once(char::is_whitespace)
                    .ok_or(Error::Usage(":ans <input> <expr>"))?;
                let text = if name == "ans" {
                    let (ast, text) = self.check(source);
                    self.student.insert(input.to_string(), ast);
                    text
                } else {
                    self.teacher.insert(input.to_string(), parse(source));
                    format!("{} set", input)
                };
                Ok(text)
            },
            "nodes" => {
                let prt = self.prt.as_ref().ok_or(Error::NoPrt)?;
                let mut text = String::new();
                for name in prt.reverse_post_order() {
                    if let Some(node) = prt.node(name) {
                        let _ = writeln!(text, "{}: {}({}, {})", name, node.answer_test, node.sans, node.tans);
                    }
                }
                Ok(text.trim_end().to_string())
            },
            "eval" => {
                let prt = self.prt.as_ref().ok_or(Error::NoPrt)?;
                let evaluator = PrtEvaluator::new(&self.registry)?
                    .with_security(self.security.clone());
                let result = evaluator.evaluate(prt, &self.student, &self.teacher, &self.options);
                Ok(describe(&result))
            },
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }

    fn rebuild(&mut self) -> Result<(), Error> {
        let names = self.filters.iter().map(String::as_str).collect::<Vec<_>>();
        self.pipeline = self.registry.build_pipeline(&names, &self.settings, true)?;
        info!(filters = ?self.pipeline.names(), "pipeline rebuilt");
        Ok(())
    }

    /// Parses and filters an expression, describing what the filters found.
    fn check(&self, source: &str) -> (Ast, String) {
        let mut ast = parse(source);
        let ctx = FilterContext::new(&self.security, &self.translator);
        let report = self.pipeline.run(&mut ast, &ctx);

        let mut text = String::new();
        let _ = writeln!(text, "{}", ast.display(ast.root()));
        for err in ast.errors().iter().chain(report.errors()) {
            text.push_str(&err.render("input", source));
        }
        if !report.notes().is_empty() {
            let _ = writeln!(text, "notes: {}", report.notes().join(", "));
        }
        if !ast.is_valid() {
            let _ = writeln!(text, "invalid");
        }
        (ast, text.trim_end().to_string())
    }
}

/// Summarises an evaluation for the terminal.
fn describe(result: &EvaluationResult) -> String {
    let show = |value: Option<f64>| value.map_or("-".to_string(), |v| v.to_string());

    let mut text = String::new();
    let _ = writeln!(text, "{}", result.signature());
    let _ = writeln!(text, "score: {}, penalty: {}", show(result.score()), show(result.penalty()));
    for entry in result.path() {
        let _ = writeln!(text, "  {} -> {} ({})", entry.node, entry.branch, entry.note);
    }
    if !result.answer_notes().is_empty() {
        let _ = writeln!(text, "notes: {}", result.answer_notes().join(" | "));
    }
    let feedback = result.rendered_feedback();
    if !feedback.is_empty() {
        let _ = writeln!(text, "feedback: {}", feedback);
    }
    for err in result.fv_errors().into_iter().chain(result.errors()) {
        let _ = writeln!(text, "error in {}: {}", err.context, err.message);
    }
    text.trim_end().to_string()
}
