// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Write paths declare the cache entries they make obsolete.

use freshet::{Cache, Invalidation, Mutation, NamespaceConfig};

struct UpdateStudent {
    id: String,
    name: String,
}

impl Mutation for UpdateStudent {
    type Output = ();
    type Error = anyhow::Error;

    fn invalidations(&self) -> Vec<Invalidation> {
        vec![
            Invalidation::key("student-details", self.id.clone()),
            Invalidation::prefix("student-list", "students_"),
        ]
    }

    async fn apply(self) -> anyhow::Result<()> {
        println!("UPDATE students SET name = '{}' WHERE id = '{}'", self.name, self.id);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let cache = Cache::<String>::builder()
        .namespace(NamespaceConfig::entity("student-details"))
        .namespace(NamespaceConfig::volatile("student-list"))
        .build()?;

    cache.set("student-details", "p1", "Ada".into())?;
    cache.set("student-list", "students_page_1", "Ada, Grace".into())?;
    cache.set("student-list", "summary", "2 students".into())?;

    cache
        .mutate(UpdateStudent {
            id: "p1".into(),
            name: "Ada Lovelace".into(),
        })
        .await?;

    println!("details cached: {}", cache.contains("student-details", "p1")?);
    println!("page cached:    {}", cache.contains("student-list", "students_page_1")?);
    println!("summary cached: {}", cache.contains("student-list", "summary")?);
    Ok(())
}
