//! Definition and conditional builtins: `define`, `pushdef`, `popdef`,
//! `undefine`, `defn`, `ifdef`, `ifelse`, `indir`, `builtin`, `dumpdef`.

use crate::builtins::{self, non_empty};
use crate::error::{Error, Result};
use crate::macros::{ArgValue, Definition, Macro};
use crate::processor::Processor;

enum DefineMode {
    Insert,
    Push,
}

fn define_macro(
    processor: &mut Processor,
    args: &[ArgValue],
    mode: DefineMode,
) -> Result<Option<String>> {
    let name = args[1].as_text().to_string();
    let doc = processor.take_pending_doc();
    let def = match args.get(2) {
        // a handle from `defn` re-registers the builtin under this name
        Some(ArgValue::Builtin(id)) => Definition::Builtin(*id),
        Some(ArgValue::Text(body)) => Definition::Text(body.clone()),
        None => Definition::Text(String::new()),
    };
    let mac = Macro {
        name,
        def,
        traced: false,
        doc,
    };
    match mode {
        DefineMode::Insert => processor.macros.insert(mac),
        DefineMode::Push => processor.macros.pushdef(mac),
    }
    Ok(None)
}

pub(super) fn define(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    define_macro(processor, args, DefineMode::Insert)
}

pub(super) fn pushdef(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    define_macro(processor, args, DefineMode::Push)
}

pub(super) fn popdef(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    for arg in &args[1..] {
        processor.macros.popdef(arg.as_text());
    }
    Ok(None)
}

pub(super) fn undefine(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    for arg in &args[1..] {
        processor.macros.undefine(arg.as_text());
    }
    Ok(None)
}

/// For a text macro, the quoted body (the quotes keep it from being
/// rescanned). For a lone builtin, a macro-handle source is pushed so the
/// builtin becomes the next input token.
pub(super) fn defn(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    if args.len() == 2 {
        if let Some(Definition::Builtin(id)) =
            processor.macros.lookup(args[1].as_text()).map(|m| m.def.clone())
        {
            processor.input.push_macro(id);
            return Ok(None);
        }
    }
    let mut out = String::new();
    for arg in &args[1..] {
        let name = arg.as_text();
        match processor.macros.lookup(name).map(|m| m.def.clone()) {
            Some(Definition::Text(body)) => out.push_str(&processor.quote(&body)),
            Some(Definition::Builtin(_)) => {
                processor.warn(format!("cannot concatenate builtin `{name}'"));
            }
            None => {}
        }
    }
    Ok(non_empty(&out))
}

pub(super) fn ifdef(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let result = if processor.macros.is_defined(args[1].as_text()) {
        args[2].as_text()
    } else {
        args.get(3).map(ArgValue::as_text).unwrap_or("")
    };
    Ok(non_empty(result))
}

/// Compares in triples; the first matching triple's third element wins.
/// `ifelse(x)` expands to nothing; the four- or five-argument tail acts
/// as the else branch.
pub(super) fn ifelse(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    if args.len() == 2 {
        return Ok(None);
    }
    if args.len() < 4 {
        return Err(Error::TooFewArguments(args[0].as_text().to_string()));
    }
    if (args.len() + 2) % 3 > 1 {
        processor.warn(format!(
            "excess arguments to builtin `{}' ignored",
            args[0].as_text()
        ));
    }
    let mut index = 1;
    loop {
        if args[index].as_text() == args[index + 1].as_text() {
            return Ok(non_empty(args[index + 2].as_text()));
        }
        match args.len() - index {
            3 => return Ok(None),
            4 | 5 => return Ok(non_empty(args[index + 3].as_text())),
            _ => index += 3,
        }
    }
}

/// Invokes a macro by runtime name.
pub(super) fn indir(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let name = args[1].as_text().to_string();
    let Some(mac) = processor.macros.lookup(&name).cloned() else {
        return Err(Error::UndefinedMacro(name));
    };
    let sub_args = args[1..].to_vec();
    match &mac.def {
        Definition::Builtin(id) => builtins::invoke(processor, *id, &name, &sub_args),
        Definition::Text(body) => Ok(Some(processor.expand_user_macro(body, &sub_args))),
    }
}

/// Invokes the original builtin even when the name has been redefined.
pub(super) fn builtin_call(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let name = args[1].as_text().to_string();
    let Some(id) = builtins::find_by_name(&name) else {
        return Err(Error::UnknownBuiltin(name));
    };
    let sub_args = args[1..].to_vec();
    builtins::invoke(processor, id, &name, &sub_args)
}

pub(super) fn dumpdef(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    if args.len() == 1 {
        let names: Vec<String> = processor
            .macros
            .names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in names {
            processor.dump_macro(&name);
        }
    } else {
        for arg in &args[1..] {
            let name = arg.as_text().to_string();
            processor.dump_macro(&name);
        }
    }
    Ok(None)
}
