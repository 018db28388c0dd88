/// Active-uniform reflection from GLSL source text
///
/// A small declaration scanner used by `RecordingContext` to decide which
/// uniform names a linked program exposes, the way a driver would report
/// them: struct uniforms expand to `name.field`, arrays to `name[i]`
/// (plus the bare `name` alias for arrays of basic types). Array sizes may
/// be literals, `#define` constants or `const int` constants.
///
/// Uniform blocks are skipped: only default-block uniforms have locations.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct Field {
    ty: String,
    name: String,
    array_len: Option<u32>,
}

/// Return every active uniform name declared by `source`, in declaration order
pub fn reflect_uniforms(source: &str) -> Vec<String> {
    let stripped = strip_comments(source);
    let mut constants: FxHashMap<String, u32> = FxHashMap::default();

    let mut body = String::with_capacity(stripped.len());
    for line in stripped.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix('#') {
            let mut parts = rest.split_whitespace();
            if parts.next() == Some("define") {
                if let (Some(name), Some(value)) = (parts.next(), parts.next()) {
                    if let Ok(v) = value.trim_end_matches('u').parse::<u32>() {
                        constants.insert(name.to_string(), v);
                    }
                }
            }
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }

    let tokens = tokenize(&body);
    let mut structs: FxHashMap<String, Vec<Field>> = FxHashMap::default();
    let mut names = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i].as_str() {
            "const" => {
                // const int NAME = N ;
                if i + 4 < tokens.len() && tokens[i + 3] == "=" {
                    if let Ok(v) = tokens[i + 4].trim_end_matches('u').parse::<u32>() {
                        constants.insert(tokens[i + 2].clone(), v);
                    }
                }
                i += 1;
            }
            "struct" if i + 2 < tokens.len() && tokens[i + 2] == "{" => {
                let name = tokens[i + 1].clone();
                let (fields, next) = parse_fields(&tokens, i + 3, &constants);
                structs.insert(name, fields);
                i = next;
            }
            "uniform" => {
                let mut j = i + 1;
                while j < tokens.len() && is_qualifier(&tokens[j]) {
                    j += 1;
                }
                if j + 1 < tokens.len() && tokens[j + 1] == "{" {
                    i = skip_block(&tokens, j + 1);
                    continue;
                }
                let Some(ty) = tokens.get(j).cloned() else { break };
                j += 1;
                loop {
                    let Some(name) = tokens.get(j).cloned() else { break };
                    j += 1;
                    let mut array_len = None;
                    if tokens.get(j).map(String::as_str) == Some("[") {
                        array_len = tokens.get(j + 1).and_then(|t| resolve_len(t, &constants));
                        j += 3;
                    }
                    let field = Field { ty: ty.clone(), name, array_len };
                    expand(&field, "", &structs, &mut names);
                    match tokens.get(j).map(String::as_str) {
                        Some(",") => j += 1,
                        _ => break,
                    }
                }
                i = j;
            }
            _ => i += 1,
        }
    }

    names
}

fn is_qualifier(token: &str) -> bool {
    matches!(token, "highp" | "mediump" | "lowp" | "flat" | "smooth")
}

fn resolve_len(token: &str, constants: &FxHashMap<String, u32>) -> Option<u32> {
    token
        .trim_end_matches('u')
        .parse::<u32>()
        .ok()
        .or_else(|| constants.get(token).copied())
}

/// Parse `type name[N], name2; ...` up to the closing brace of a struct
fn parse_fields(
    tokens: &[String],
    mut i: usize,
    constants: &FxHashMap<String, u32>,
) -> (Vec<Field>, usize) {
    let mut fields = Vec::new();
    while i < tokens.len() && tokens[i] != "}" {
        while i < tokens.len() && is_qualifier(&tokens[i]) {
            i += 1;
        }
        let Some(ty) = tokens.get(i).cloned() else { break };
        i += 1;
        loop {
            let Some(name) = tokens.get(i).cloned() else { break };
            i += 1;
            let mut array_len = None;
            if tokens.get(i).map(String::as_str) == Some("[") {
                array_len = tokens.get(i + 1).and_then(|t| resolve_len(t, constants));
                i += 3;
            }
            fields.push(Field { ty: ty.clone(), name, array_len });
            match tokens.get(i).map(String::as_str) {
                Some(",") => i += 1,
                _ => break,
            }
        }
        if tokens.get(i).map(String::as_str) == Some(";") {
            i += 1;
        }
    }
    // skip "}" and the trailing ";"
    i += 1;
    if tokens.get(i).map(String::as_str) == Some(";") {
        i += 1;
    }
    (fields, i)
}

fn skip_block(tokens: &[String], open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < tokens.len() {
        match tokens[i].as_str() {
            "{" => depth += 1,
            "}" => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        i += 1;
    }
    while i < tokens.len() && tokens[i] != ";" {
        i += 1;
    }
    i + 1
}

fn expand(field: &Field, prefix: &str, structs: &FxHashMap<String, Vec<Field>>, out: &mut Vec<String>) {
    let base = format!("{}{}", prefix, field.name);
    let members = structs.get(&field.ty);
    match (field.array_len, members) {
        (Some(len), Some(members)) => {
            for index in 0..len {
                let element = format!("{}[{}].", base, index);
                for member in members {
                    expand(member, &element, structs, out);
                }
            }
        }
        (Some(len), None) => {
            out.push(base.clone());
            for index in 0..len {
                out.push(format!("{}[{}]", base, index));
            }
        }
        (None, Some(members)) => {
            let element = format!("{}.", base);
            for member in members {
                expand(member, &element, structs, out);
            }
        }
        (None, None) => out.push(base),
    }
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' {
            match chars.peek() {
                Some('/') => {
                    for n in chars.by_ref() {
                        if n == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                    continue;
                }
                Some('*') => {
                    chars.next();
                    let mut prev = '\0';
                    for n in chars.by_ref() {
                        if prev == '*' && n == '/' {
                            break;
                        }
                        if n == '\n' {
                            out.push('\n');
                        }
                        prev = n;
                    }
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

fn tokenize(source: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in source.chars() {
        if c.is_alphanumeric() || c == '_' || c == '.' {
            current.push(c);
            continue;
        }
        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if !c.is_whitespace() {
            tokens.push(c.to_string());
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
#[path = "uniform_reflection_tests.rs"]
mod tests;
