//! The builtin macro set.
//!
//! Builtins are identified by a stable [`BuiltinId`], an index into the
//! static table, so a definition captured by `defn` can be re-registered
//! under another name and still be recognized. Two universal argument
//! rules run before every handler: too few arguments abort the current
//! expansion, excess arguments are warned about and truncated. Builtins
//! without `groks_macro_args` see builtin handles coerced to empty
//! strings before the body runs.

mod debug;
mod definitions;
mod diversions;
mod strings;
mod system;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::macros::{ArgValue, Macro, MacroTable};
use crate::processor::Processor;

/// Stable identity of a builtin; survives redefinition and `defn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuiltinId(pub(crate) usize);

pub type BuiltinFn = fn(&mut Processor, &[ArgValue]) -> Result<Option<String>>;

/// One row of the builtin table. Argument counts include the macro name
/// itself; `max_args == 0` means unlimited.
pub struct BuiltinSpec {
    pub name: &'static str,
    pub gnu_extension: bool,
    pub groks_macro_args: bool,
    pub blind_no_args: bool,
    pub min_args: usize,
    pub max_args: usize,
    pub handler: BuiltinFn,
}

const fn builtin(
    name: &'static str,
    gnu_extension: bool,
    groks_macro_args: bool,
    blind_no_args: bool,
    min_args: usize,
    max_args: usize,
    handler: BuiltinFn,
) -> BuiltinSpec {
    BuiltinSpec {
        name,
        gnu_extension,
        groks_macro_args,
        blind_no_args,
        min_args,
        max_args,
        handler,
    }
}

/// The builtin table. Row order is frozen: a [`BuiltinId`] is an index
/// into it.
#[rustfmt::skip]
pub static BUILTINS: &[BuiltinSpec] = &[
    //      name            GNUext macros blind  min max
    builtin("__file__",     true,  false, false, 1, 1, system::file),
    builtin("__line__",     true,  false, false, 1, 1, system::line),
    builtin("__program__",  true,  false, false, 1, 1, system::program),
    builtin("builtin",      true,  true,  true,  2, 0, definitions::builtin_call),
    builtin("changecom",    false, false, false, 1, 3, diversions::changecom),
    builtin("changequote",  false, false, false, 1, 3, diversions::changequote),
    builtin("debugmode",    true,  false, false, 1, 2, debug::debugmode),
    builtin("debugfile",    true,  false, false, 1, 2, debug::debugfile),
    builtin("decr",         false, false, true,  2, 2, strings::decr),
    builtin("define",       false, true,  true,  2, 3, definitions::define),
    builtin("defn",         false, false, true,  2, 0, definitions::defn),
    builtin("divert",       false, false, false, 1, 2, diversions::divert),
    builtin("divnum",       false, false, false, 1, 1, diversions::divnum),
    builtin("dnl",          false, false, false, 1, 1, diversions::dnl),
    builtin("dumpdef",      false, false, false, 1, 0, definitions::dumpdef),
    builtin("errprint",     false, false, true,  2, 0, system::errprint),
    builtin("esyscmd",      true,  false, true,  1, 2, system::esyscmd),
    builtin("eval",         false, false, true,  2, 4, strings::eval_builtin),
    builtin("format",       true,  false, true,  2, 0, strings::format),
    builtin("ifdef",        false, false, true,  3, 4, definitions::ifdef),
    builtin("ifelse",       false, false, true,  2, 0, definitions::ifelse),
    builtin("include",      false, false, true,  2, 2, system::include),
    builtin("incr",         false, false, true,  2, 2, strings::incr),
    builtin("index",        false, false, true,  3, 3, strings::index),
    builtin("indir",        true,  true,  true,  2, 0, definitions::indir),
    builtin("len",          false, false, true,  2, 2, strings::len),
    builtin("m4exit",       false, false, false, 1, 2, system::m4exit),
    builtin("m4wrap",       false, false, true,  2, 0, system::m4wrap),
    builtin("maketemp",     false, false, true,  2, 2, system::maketemp),
    builtin("mkstemp",      false, false, true,  2, 2, system::mkstemp),
    builtin("patsubst",     true,  false, true,  2, 4, strings::patsubst),
    builtin("popdef",       false, false, true,  2, 0, definitions::popdef),
    builtin("pushdef",      false, true,  true,  2, 3, definitions::pushdef),
    builtin("regexp",       true,  false, true,  2, 4, strings::regexp),
    builtin("shift",        false, false, true,  2, 0, strings::shift),
    builtin("sinclude",     false, false, true,  2, 2, system::sinclude),
    builtin("substr",       false, false, true,  2, 4, strings::substr),
    builtin("syscmd",       false, false, true,  1, 2, system::syscmd),
    builtin("sysval",       false, false, false, 1, 1, system::sysval),
    builtin("traceoff",     false, false, false, 1, 0, debug::traceoff),
    builtin("traceon",      false, false, false, 1, 0, debug::traceon),
    builtin("translit",     false, false, true,  2, 4, strings::translit),
    builtin("undefine",     false, false, true,  2, 0, definitions::undefine),
    builtin("undivert",     false, false, false, 1, 0, diversions::undivert),
];

static BY_NAME: Lazy<HashMap<&'static str, BuiltinId>> = Lazy::new(|| {
    BUILTINS
        .iter()
        .enumerate()
        .map(|(index, spec)| (spec.name, BuiltinId(index)))
        .collect()
});

pub fn spec(id: BuiltinId) -> &'static BuiltinSpec {
    &BUILTINS[id.0]
}

/// The original builtin for `name`, regardless of redefinition.
pub fn find_by_name(name: &str) -> Option<BuiltinId> {
    BY_NAME.get(name).copied()
}

/// Installs the builtins and the predefined platform macros into
/// `table`, honoring `no_gnu_extensions` and `prefix_all_builtins`.
pub fn install(table: &mut MacroTable, config: &Config) {
    for (index, spec) in BUILTINS.iter().enumerate() {
        if config.no_gnu_extensions && spec.gnu_extension {
            continue;
        }
        let name = if config.prefix_all_builtins {
            format!("m4_{}", spec.name)
        } else {
            spec.name.to_string()
        };
        table.insert(Macro::builtin(name, BuiltinId(index)));
    }

    let platform = if cfg!(windows) {
        ("windows", "__windows__")
    } else {
        ("unix", "__unix__")
    };
    let (legacy, gnu) = platform;
    if config.no_gnu_extensions {
        table.insert(Macro::text(legacy, ""));
    } else {
        table.insert(Macro::text(gnu, ""));
        table.insert(Macro::text("__gnu__", ""));
    }
}

/// Applies the universal argument rules, then dispatches to the handler.
pub(crate) fn invoke(
    processor: &mut Processor,
    id: BuiltinId,
    name: &str,
    args: &[ArgValue],
) -> Result<Option<String>> {
    let spec = spec(id);
    if args.len() < spec.min_args {
        return Err(Error::TooFewArguments(name.to_string()));
    }
    let mut call_args = args.to_vec();
    if spec.max_args != 0 && call_args.len() > spec.max_args {
        processor.warn(format!("excess arguments to builtin `{name}' ignored"));
        call_args.truncate(spec.max_args);
    }
    if !spec.groks_macro_args {
        for arg in call_args.iter_mut().skip(1) {
            if arg.is_builtin() {
                *arg = ArgValue::Text(String::new());
            }
        }
    }
    processor.report_builtin_call(name, &call_args);
    (spec.handler)(processor, &call_args)
}

/// `Some(text)` unless `text` is empty; builtins use this so empty
/// results skip the pushback entirely.
pub(crate) fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Parses a numeric builtin argument.
pub(crate) fn parse_number(text: &str) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| Error::BadNumber(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_are_unique_and_indexed() {
        assert_eq!(BY_NAME.len(), BUILTINS.len());
        for (index, spec) in BUILTINS.iter().enumerate() {
            assert_eq!(find_by_name(spec.name), Some(BuiltinId(index)));
        }
    }

    #[test]
    fn install_registers_everything_by_default() {
        let mut table = MacroTable::new();
        install(&mut table, &Config::default());
        assert!(table.is_defined("define"));
        assert!(table.is_defined("patsubst"));
        assert!(table.is_defined("__gnu__"));
        let platform = if cfg!(windows) { "__windows__" } else { "__unix__" };
        assert!(table.is_defined(platform));
        assert!(!table.is_defined("unix"));
    }

    #[test]
    fn traditional_mode_skips_gnu_extensions() {
        let mut config = Config::default();
        config.no_gnu_extensions = true;
        let mut table = MacroTable::new();
        install(&mut table, &config);
        assert!(table.is_defined("define"));
        assert!(!table.is_defined("patsubst"));
        assert!(!table.is_defined("__gnu__"));
        if cfg!(windows) {
            assert!(table.is_defined("windows"));
        } else {
            assert!(table.is_defined("unix"));
        }
    }

    #[test]
    fn prefix_mode_renames_every_builtin() {
        let mut config = Config::default();
        config.prefix_all_builtins = true;
        let mut table = MacroTable::new();
        install(&mut table, &config);
        assert!(table.is_defined("m4_define"));
        assert!(!table.is_defined("define"));
    }
}
