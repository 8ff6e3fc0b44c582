use crate::output::print_json;
use deskhand_core::Key;

/// With no arguments, list every accepted name. Otherwise show what each
/// given name resolves to; clap has already rejected unknown names.
pub fn run(keys: &[Key], json: bool) -> anyhow::Result<()> {
    if keys.is_empty() {
        list(json)
    } else {
        resolve(keys, json)
    }
}

fn list(json: bool) -> anyhow::Result<()> {
    let names = Key::names();

    if json {
        print_json(&names)?;
        return Ok(());
    }

    for name in names {
        if Key::from_name(name).is_ok_and(Key::is_modifier) {
            println!("{name:<12} (modifier)");
        } else {
            println!("{name}");
        }
    }
    println!();
    println!("Also accepted: f1-f12, num0-num9 and single characters (a-z, 0-9, punctuation).");
    Ok(())
}

fn resolve(keys: &[Key], json: bool) -> anyhow::Result<()> {
    if json {
        let value: Vec<_> = keys
            .iter()
            .map(|key| {
                serde_json::json!({
                    "key": key.to_string(),
                    "modifier": key.is_modifier(),
                })
            })
            .collect();
        print_json(&value)?;
        return Ok(());
    }

    for key in keys {
        if key.is_modifier() {
            println!("{:<12} (modifier)", key.to_string());
        } else {
            println!("{key}");
        }
    }
    Ok(())
}
