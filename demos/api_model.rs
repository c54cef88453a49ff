use restjson::{FieldDescriptor, JsonOptions, RestMap, RestModel};
use serde::Deserialize;

/// A client-side model of a repository returned by some hosting API.
#[derive(Debug, Deserialize)]
struct Repository {
    #[serde(rename = "Id", alias = "id")]
    id: u64,

    #[serde(rename = "FullName", alias = "fullName", alias = "full_name")]
    full_name: String,

    #[serde(rename = "Private", alias = "private", default)]
    private: bool,

    #[serde(skip)]
    extensions: RestMap,
}

impl RestModel for Repository {
    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::field("Id"),
            FieldDescriptor::field("FullName").renamed("full_name"),
            FieldDescriptor::field("Private"),
            FieldDescriptor::catch_all("Extensions", |r: &mut Self| &mut r.extensions),
        ]
    }
}

fn main() -> anyhow::Result<()> {
    println!("restjson Example: Forward-Compatible API Models\n");

    let options = JsonOptions::new().with_rest::<Repository>()?;

    let responses = [
        r#"{"id": 1, "full_name": "alice/furnace", "private": false}"#,
        r#"{"id": 2, "fullName": "bob/tools", "stars": 42, "topics": ["cli", "json"],
            "license": {"key": "mit"}, "archived": true}"#,
        r#"null"#,
    ];

    for (i, response) in responses.iter().enumerate() {
        println!("=== Response {} ===", i + 1);
        match restjson::from_str::<Repository>(response, &options)? {
            Some(repo) => {
                println!("id: {}, name: {}, private: {}", repo.id, repo.full_name, repo.private);
                let mut keys: Vec<_> = repo.extensions.iter().collect();
                keys.sort();
                for (key, value) in keys {
                    println!("  + {} = {}", key, value);
                }
            }
            None => println!("(null)"),
        }
        println!();
    }

    Ok(())
}
