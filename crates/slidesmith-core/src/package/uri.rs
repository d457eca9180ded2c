//! Part-name arithmetic. Part names are stored without the leading `/`
//! (`ppt/slides/slide1.xml`); the package root is the empty string.

/// Directory portion of a part name, without a trailing slash.
pub fn directory(part_name: &str) -> &str {
    match part_name.rfind('/') {
        Some(idx) => &part_name[..idx],
        None => "",
    }
}

pub fn file_name(part_name: &str) -> &str {
    match part_name.rfind('/') {
        Some(idx) => &part_name[idx + 1..],
        None => part_name,
    }
}

/// Lower-cased extension of a part name, if any.
pub fn extension(part_name: &str) -> Option<String> {
    let name = file_name(part_name);
    name.rfind('.')
        .filter(|&idx| idx + 1 < name.len())
        .map(|idx| name[idx + 1..].to_ascii_lowercase())
}

/// Location of the relationship part for `part_name` (`_rels/.rels` for the
/// package root).
pub fn rels_path_for(part_name: &str) -> String {
    if part_name.is_empty() {
        return "_rels/.rels".to_string();
    }
    let dir = directory(part_name);
    let file = file_name(part_name);
    if dir.is_empty() {
        format!("_rels/{}.rels", file)
    } else {
        format!("{}/_rels/{}.rels", dir, file)
    }
}

/// Inverse of [`rels_path_for`]. Returns `None` for names that are not
/// relationship parts.
pub fn source_part_for_rels(rels_path: &str) -> Option<String> {
    let file = file_name(rels_path).strip_suffix(".rels")?;
    let dir = directory(rels_path);
    let owner_dir = if dir == "_rels" {
        ""
    } else {
        dir.strip_suffix("/_rels")?
    };
    if owner_dir.is_empty() {
        Some(file.to_string())
    } else {
        Some(format!("{}/{}", owner_dir, file))
    }
}

/// Resolve a relationship target written relative to `source_part` into an
/// absolute part name.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute);
    }
    let base = directory(source_part);
    if base.is_empty() {
        normalize(target)
    } else {
        normalize(&format!("{}/{}", base, target))
    }
}

/// Relative target from `source_part` to `target_part`, as written into a
/// relationship file.
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let from: Vec<&str> = directory(source_part)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let to: Vec<&str> = target_part.split('/').filter(|s| !s.is_empty()).collect();
    let to_dir = &to[..to.len().saturating_sub(1)];

    let common = from
        .iter()
        .zip(to_dir.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = std::iter::repeat("..").take(from.len() - common).collect();
    segments.extend_from_slice(&to[common..]);
    segments.join("/")
}

fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out.join("/")
}
