use crate::bundle::PromptSpec;
use crate::file::Language;
use crate::selection::{folder_checked, Selection};
use crate::tree::TreeNode;
use std::collections::HashMap;
use tracing::{debug, info};

/// Logs the bundled files as a tree with per-directory token sums, then the
/// overall total against the budget.
pub fn print_stats(tree: &TreeNode, spec: &PromptSpec) {
    debug!("Printing token statistics for {} files", spec.files.len());
    for line in format_stats(tree, spec).lines() {
        info!("{}", line);
    }
}

pub fn format_stats(tree: &TreeNode, spec: &PromptSpec) -> String {
    let tokens: HashMap<&str, u64> = spec
        .files
        .iter()
        .map(|e| (e.path.as_str(), e.token_estimate))
        .collect();

    let mut out = String::new();
    write_stats(tree, &tokens, "", &mut out);

    let total = spec.metadata.total_tokens_estimate;
    let budget = spec.target_token_budget;
    let percent = if budget > 0 { (total * 100 / budget).min(100) } else { 0 };
    out.push_str(&format!(
        "Overall ({} tokens, {}% of {} budget)\n",
        total, percent, budget
    ));
    for warning in &spec.metadata.warnings {
        out.push_str(&format!("Warning: {}\n", warning));
    }
    out
}

fn subtree_tokens(node: &TreeNode, tokens: &HashMap<&str, u64>) -> Option<u64> {
    let own = node
        .file
        .as_ref()
        .and_then(|f| tokens.get(f.path.as_str()).copied());
    let children: Vec<u64> = node
        .children
        .iter()
        .filter_map(|c| subtree_tokens(c, tokens))
        .collect();
    if own.is_none() && children.is_empty() {
        return None;
    }
    Some(own.unwrap_or(0) + children.iter().sum::<u64>())
}

fn write_stats(node: &TreeNode, tokens: &HashMap<&str, u64>, prefix: &str, out: &mut String) {
    let bundled: Vec<(&TreeNode, u64)> = node
        .children
        .iter()
        .filter_map(|c| subtree_tokens(c, tokens).map(|t| (c, t)))
        .collect();

    for (i, (child, total)) in bundled.iter().enumerate() {
        let is_last = i == bundled.len() - 1;
        let connector = if is_last { "┗━━" } else { "┣━━" };
        if child.children.is_empty() {
            out.push_str(&format!(
                "{}{} {} {} ({} tokens)\n",
                prefix,
                connector,
                icon_for(child),
                child.name,
                total
            ));
        } else {
            out.push_str(&format!("{}{} 📂 {} ({} tokens)\n", prefix, connector, child.name, total));
            let child_prefix = format!("{}{}    ", prefix, if is_last { " " } else { "┃" });
            write_stats(child, tokens, &child_prefix, out);
        }
    }
}

/// Renders the filtered tree with checkbox markers. Folders show `[x]` only
/// when every selectable file below them is selected.
pub fn render_tree(tree: &TreeNode, selection: &Selection) -> String {
    let mut out = String::new();
    write_tree(tree, selection, "", &mut out);
    out
}

fn write_tree(node: &TreeNode, selection: &Selection, prefix: &str, out: &mut String) {
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i == node.children.len() - 1;
        let connector = if is_last { "┗━━" } else { "┣━━" };
        let checked = match &child.file {
            Some(file) if child.children.is_empty() => selection.contains(&file.path),
            _ => folder_checked(child, selection),
        };
        let mark = if checked { "[x]" } else { "[ ]" };
        if child.children.is_empty() {
            let binary = child.file.as_ref().is_some_and(|f| f.binary);
            let mark = if binary { "   " } else { mark };
            out.push_str(&format!("{}{} {} {} {}\n", prefix, connector, mark, icon_for(child), child.name));
        } else {
            out.push_str(&format!("{}{} {} 📂 {}\n", prefix, connector, mark, child.name));
            let child_prefix = format!("{}{}    ", prefix, if is_last { " " } else { "┃" });
            write_tree(child, selection, &child_prefix, out);
        }
    }
}

fn icon_for(node: &TreeNode) -> &'static str {
    let Some(file) = &node.file else {
        return "📁";
    };
    if file.binary {
        return "🖼️";
    }
    match file.language {
        Language::Ts | Language::Tsx => "🔷",
        Language::Js | Language::Jsx => "🟨",
        Language::Py => "🐍",
        Language::Json => "🔖",
        Language::Md => "📝",
        Language::Yml => "🗂️",
        Language::Sh => "🐚",
        Language::Docker => "🐳",
        Language::Other => "📄",
    }
}
