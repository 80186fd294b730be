use std::collections::HashMap;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const CATALOG_DIR: &str = "src/catalog";

/// Operand counts are stored as `u8`.
const MAX_OPERANDS: usize = u8::MAX as usize;

/// Every target with an extension catalog: (catalog file stem, static name, `Arch` variant).
const ARCHES: &[(&str, &str, &str)] = &[
    ("x86", "X86", "X86"),
    ("x64", "X64", "X64"),
    ("arm", "ARM", "Arm"),
    ("arm64", "ARM64", "Arm64"),
    ("none", "NONE", "None"),
];

/// One opcode line from a catalog table.
struct Entry {
    name: String,
    category: &'static str,
    result: Option<&'static str>,
    operands: Vec<&'static str>,
    rest: Option<&'static str>,
    flags: Vec<&'static str>,
    /// `file:line` the entry was read from, for diagnostics.
    origin: String,
}

fn main() {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", CATALOG_DIR);
    println!("cargo:rerun-if-env-changed=LIR_TARGET_ARCH");

    let shared = read_catalog("shared");
    check_unique(&shared, &[]);

    let mut extensions = Vec::new();
    for &(stem, _, _) in ARCHES {
        let ext = read_catalog(stem);
        check_unique(&shared, &ext);
        let total = shared.len() + ext.len();
        if total > u16::MAX as usize + 1 {
            panic!("{} catalog: {} opcodes do not fit in a u16 tag", stem, total);
        }
        extensions.push(ext);
    }

    let active = select_arch();
    let active_idx = ARCHES
        .iter()
        .position(|&(stem, _, _)| stem == active)
        .expect("selected arch has a catalog");
    let active_ext = &extensions[active_idx];

    // Static catalog data for every architecture.
    let mut tables = String::new();
    write_catalog(&mut tables, "SHARED", "shared", &shared);
    for (&(stem, ident, _), ext) in ARCHES.iter().zip(&extensions) {
        write_catalog(&mut tables, ident, stem, ext);
    }
    write_out(&out_dir, "catalog_tables.rs", &tables);

    let mut arch = String::new();
    writeln!(arch, "impl Arch {{").unwrap();
    writeln!(arch, "    /// The target whose extension opcodes are compiled into [`Opcode`](crate::ir::opcode::Opcode).").unwrap();
    writeln!(arch, "    pub const ACTIVE: Arch = Arch::{};", ARCHES[active_idx].2).unwrap();
    writeln!(arch, "}}").unwrap();
    write_out(&out_dir, "active_arch.rs", &arch);

    write_out(&out_dir, "opcode_enum.rs", &gen_opcode_enum(&shared, active, active_ext));
    write_out(&out_dir, "opcode_list.rs", &gen_opcode_list(&shared, active_ext));

    eprintln!(
        "Generated LIR catalog: {} shared opcodes, {} {} extension opcodes",
        shared.len(),
        active_ext.len(),
        active
    );
}

fn write_out(out_dir: &str, file: &str, contents: &str) {
    let dest = Path::new(out_dir).join(file);
    fs::write(&dest, contents).unwrap_or_else(|e| panic!("Failed to write {}: {}", dest.display(), e));
}

/// Picks the target: an `arch-*` feature, then `LIR_TARGET_ARCH`, then the host architecture.
fn select_arch() -> &'static str {
    let enabled: Vec<&'static str> = ARCHES
        .iter()
        .map(|&(stem, _, _)| stem)
        .filter(|stem| env::var_os(format!("CARGO_FEATURE_ARCH_{}", stem.to_uppercase())).is_some())
        .collect();
    match enabled.as_slice() {
        [one] => return *one,
        [] => {}
        many => panic!("at most one arch-* feature may be enabled, got {:?}", many),
    }

    if let Ok(requested) = env::var("LIR_TARGET_ARCH") {
        let requested = requested.trim().to_ascii_lowercase();
        return ARCHES
            .iter()
            .map(|&(stem, _, _)| stem)
            .find(|stem| *stem == requested)
            .unwrap_or_else(|| panic!("LIR_TARGET_ARCH={} is not a known target", requested));
    }

    match env::var("CARGO_CFG_TARGET_ARCH").as_deref() {
        Ok("x86_64") => "x64",
        Ok("x86") => "x86",
        Ok("arm") => "arm",
        Ok("aarch64") => "arm64",
        _ => "none",
    }
}

fn read_catalog(stem: &str) -> Vec<Entry> {
    let path = Path::new(CATALOG_DIR).join(format!("{}.inc", stem));
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));

    let mut entries = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let origin = format!("{}:{}", path.display(), i + 1);
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        entries.push(parse_entry_line(line, origin));
    }
    entries
}

fn parse_entry_line(line: &str, origin: String) -> Entry {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 {
        panic!("{}: expected `Name category result operands flags`, got {} fields", origin, fields.len());
    }

    let name = fields[0];
    let valid = name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid {
        panic!("{}: `{}` is not a CamelCase opcode name", origin, name);
    }

    let category = category_variant(fields[1])
        .unwrap_or_else(|| panic!("{}: unknown category `{}`", origin, fields[1]));

    let result = match fields[2] {
        "-" => None,
        kind => Some(kind_variant(kind).unwrap_or_else(|| panic!("{}: unknown result kind `{}`", origin, kind))),
    };

    let mut operands = Vec::new();
    let mut rest = None;
    if fields[3] != "-" {
        let parts: Vec<&str> = fields[3].split(',').collect();
        for (j, part) in parts.iter().enumerate() {
            let (kind, variadic) = match part.strip_suffix("...") {
                Some(kind) => (kind, true),
                None => (*part, false),
            };
            let kind = kind_variant(kind).unwrap_or_else(|| panic!("{}: unknown operand kind `{}`", origin, kind));
            if variadic {
                if j + 1 != parts.len() {
                    panic!("{}: only the last operand may be variadic", origin);
                }
                rest = Some(kind);
            } else {
                operands.push(kind);
            }
        }
    }

    if operands.len() > MAX_OPERANDS {
        panic!("{}: {} operand slots, at most {} allowed", origin, operands.len(), MAX_OPERANDS);
    }

    let mut flags = Vec::new();
    if fields[4] != "-" {
        for flag in fields[4].split(',') {
            flags.push(flag_const(flag).unwrap_or_else(|| panic!("{}: unknown flag `{}`", origin, flag)));
        }
    }

    Entry { name: name.to_string(), category, result, operands, rest, flags, origin }
}

fn category_variant(keyword: &str) -> Option<&'static str> {
    Some(match keyword {
        "const" => "Constant",
        "arith" => "Arith",
        "convert" => "Convert",
        "box" => "Boxing",
        "simd" => "Simd",
        "alloc" => "Alloc",
        "prop" => "Property",
        "elem" => "Element",
        "atomic" => "Atomic",
        "string" => "Strings",
        "call" => "Call",
        "control" => "Control",
        "guard" => "Guard",
        "runtime" => "Runtime",
        "meta" => "Meta",
        "wasm" => "Wasm",
        _ => return None,
    })
}

fn kind_variant(keyword: &str) -> Option<&'static str> {
    Some(match keyword {
        "gpr" => "Gpr",
        "fpr" => "Fpr",
        "simd" => "Simd",
        "i64" => "Int64",
        "box" => "Boxed",
        "mem" => "Memory",
        "imm" => "Immediate",
        "any" => "Any",
        _ => return None,
    })
}

fn flag_const(keyword: &str) -> Option<&'static str> {
    Some(match keyword {
        "call" => "CALL",
        "bail" => "CAN_BAIL",
        "effect" => "EFFECTFUL",
        "term" => "TERMINATOR",
        _ => return None,
    })
}

/// Fails the build if a name or a generated visitor method repeats across `shared` and `ext`.
fn check_unique(shared: &[Entry], ext: &[Entry]) {
    let mut names: HashMap<&str, &str> = HashMap::new();
    let mut methods: HashMap<String, &Entry> = HashMap::new();
    for entry in shared.iter().chain(ext) {
        if let Some(first) = names.insert(&entry.name, &entry.origin) {
            panic!("{}: opcode `{}` already declared at {}", entry.origin, entry.name, first);
        }
        if let Some(other) = methods.insert(snake_case(&entry.name), entry) {
            panic!(
                "{}: opcode `{}` maps to the same visitor method as `{}` ({})",
                entry.origin, entry.name, other.name, other.origin
            );
        }
    }
}

/// `AddI` -> `add_i`, `GetDOMProperty` -> `get_dom_property`.
fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase() || prev.is_ascii_digit() || (prev.is_ascii_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

fn write_catalog(f: &mut String, ident: &str, name: &str, entries: &[Entry]) {
    writeln!(f, "/// The `{}` opcode catalog ({} entries).", name, entries.len()).unwrap();
    writeln!(f, "pub static {}: Catalog = Catalog {{", ident).unwrap();
    writeln!(f, "    name: {:?},", name).unwrap();
    writeln!(f, "    entries: &[").unwrap();
    for e in entries {
        let operands: Vec<String> = e.operands.iter().map(|k| format!("OperandKind::{}", k)).collect();
        write!(
            f,
            "        CatalogEntry {{ name: {:?}, descriptor: OperandDescriptor::new(Category::{}, &[{}])",
            e.name,
            e.category,
            operands.join(", ")
        )
        .unwrap();
        if let Some(rest) = e.rest {
            write!(f, ".with_rest(OperandKind::{})", rest).unwrap();
        }
        if let Some(result) = e.result {
            write!(f, ".with_result(OperandKind::{})", result).unwrap();
        }
        if let Some((first, others)) = e.flags.split_first() {
            write!(f, ".with_flags(OpFlags::{}", first).unwrap();
            for flag in others {
                write!(f, ".union(OpFlags::{})", flag).unwrap();
            }
            write!(f, ")").unwrap();
        }
        writeln!(f, " }},").unwrap();
    }
    writeln!(f, "    ],").unwrap();
    writeln!(f, "}};").unwrap();
    writeln!(f).unwrap();
}

fn gen_opcode_enum(shared: &[Entry], arch: &str, ext: &[Entry]) -> String {
    let mut f = String::new();
    let count = shared.len() + ext.len();

    writeln!(f, "/// LIR opcodes: the shared catalog followed by the `{}` extension catalog.", arch).unwrap();
    writeln!(f, "///").unwrap();
    writeln!(f, "/// Discriminants are the opcode tags of the merged space and never change for shared opcodes.").unwrap();
    writeln!(f, "#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]").unwrap();
    writeln!(f, "#[repr(u16)]").unwrap();
    writeln!(f, "pub enum Opcode {{").unwrap();
    writeln!(f, "    // --- shared ---").unwrap();
    for (tag, e) in shared.iter().enumerate() {
        writeln!(f, "    {} = {},", e.name, tag).unwrap();
    }
    if !ext.is_empty() {
        writeln!(f).unwrap();
        writeln!(f, "    // --- {} ---", arch).unwrap();
        for (i, e) in ext.iter().enumerate() {
            writeln!(f, "    {} = {},", e.name, shared.len() + i).unwrap();
        }
    }
    writeln!(f, "}}").unwrap();
    writeln!(f).unwrap();

    writeln!(f, "impl Opcode {{").unwrap();
    writeln!(f, "    /// Number of opcodes in the merged space.").unwrap();
    writeln!(f, "    pub const COUNT: usize = {};", count).unwrap();
    writeln!(f, "    /// Number of opcodes from the shared catalog.").unwrap();
    writeln!(f, "    pub const SHARED_COUNT: usize = {};", shared.len()).unwrap();
    writeln!(f, "    /// Every opcode, in tag order.").unwrap();
    writeln!(f, "    pub const ALL: [Opcode; {}] = [", count).unwrap();
    for e in shared.iter().chain(ext) {
        writeln!(f, "        Opcode::{},", e.name).unwrap();
    }
    writeln!(f, "    ];").unwrap();
    writeln!(f, "}}").unwrap();
    f
}

fn gen_opcode_list(shared: &[Entry], ext: &[Entry]) -> String {
    let mut f = String::new();
    writeln!(f, "/// Invokes `$m! {{ (Opcode, LView, visit_method) ... }}` with one tuple per opcode, in tag order.").unwrap();
    writeln!(f, "///").unwrap();
    writeln!(f, "/// Consumers that treat every opcode uniformly generate their code from this list.").unwrap();
    writeln!(f, "#[macro_export]").unwrap();
    writeln!(f, "macro_rules! for_each_lir_opcode {{").unwrap();
    writeln!(f, "    ($m:ident) => {{").unwrap();
    writeln!(f, "        $m! {{").unwrap();
    for e in shared.iter().chain(ext) {
        writeln!(f, "            ({}, L{}, visit_{})", e.name, e.name, snake_case(&e.name)).unwrap();
    }
    writeln!(f, "        }}").unwrap();
    writeln!(f, "    }};").unwrap();
    writeln!(f, "}}").unwrap();
    f
}
