pub const REGISTRATIONS_TABLE: &str = "event_registrations";

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub definition: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct IndexDef {
    pub name: &'static str,
    pub column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyCommand {
    Insert,
    Select,
}

#[derive(Debug, Clone, Copy)]
pub struct PolicyDef {
    pub name: &'static str,
    pub command: PolicyCommand,
}

/// Everything a relation needs to exist, expressed so that applying it twice
/// is the same as applying it once.
#[derive(Debug, Clone, Copy)]
pub struct SchemaPlan {
    pub relation: &'static str,
    pub columns: &'static [ColumnDef],
    pub indexes: &'static [IndexDef],
    pub policies: &'static [PolicyDef],
}

pub const REGISTRATIONS_SCHEMA: SchemaPlan = SchemaPlan {
    relation: REGISTRATIONS_TABLE,
    columns: &[
        ColumnDef { name: "id", definition: "BIGSERIAL PRIMARY KEY" },
        ColumnDef { name: "full_name", definition: "VARCHAR(255) NOT NULL" },
        ColumnDef { name: "email", definition: "VARCHAR(255) NOT NULL" },
        ColumnDef { name: "phone_number", definition: "VARCHAR(20) NOT NULL" },
        ColumnDef { name: "college_name", definition: "VARCHAR(255) DEFAULT ''" },
        ColumnDef { name: "department", definition: "VARCHAR(255) DEFAULT ''" },
        ColumnDef { name: "year_semester", definition: "VARCHAR(50) DEFAULT ''" },
        ColumnDef { name: "event_selection", definition: "VARCHAR(255) DEFAULT ''" },
        ColumnDef { name: "additional_notes", definition: "TEXT DEFAULT ''" },
        ColumnDef {
            name: "created_at",
            definition: "TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP",
        },
        ColumnDef {
            name: "updated_at",
            definition: "TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP",
        },
    ],
    indexes: &[
        IndexDef { name: "idx_registrations_email", column: "email" },
        IndexDef { name: "idx_registrations_created_at", column: "created_at" },
    ],
    policies: &[
        PolicyDef { name: "Allow public inserts", command: PolicyCommand::Insert },
        PolicyDef { name: "Allow public reads", command: PolicyCommand::Select },
    ],
};

impl SchemaPlan {
    /// Ordered statements. Each policy is dropped by name before it is created.
    pub fn statements(&self) -> Vec<String> {
        let relation = self.relation;
        let mut out = Vec::new();

        let columns = self
            .columns
            .iter()
            .map(|c| format!("  {} {}", c.name, c.definition))
            .collect::<Vec<_>>()
            .join(",\n");
        out.push(format!("CREATE TABLE IF NOT EXISTS {relation} (\n{columns}\n)"));

        for index in self.indexes {
            out.push(format!(
                "CREATE INDEX IF NOT EXISTS {} ON {relation}({})",
                index.name, index.column
            ));
        }

        out.push(format!("ALTER TABLE {relation} ENABLE ROW LEVEL SECURITY"));

        for policy in self.policies {
            out.push(format!("DROP POLICY IF EXISTS \"{}\" ON {relation}", policy.name));
        }
        for policy in self.policies {
            let rule = match policy.command {
                PolicyCommand::Insert => "FOR INSERT\n  WITH CHECK (true)",
                PolicyCommand::Select => "FOR SELECT\n  USING (true)",
            };
            out.push(format!("CREATE POLICY \"{}\" ON {relation}\n  {rule}", policy.name));
        }

        out
    }

    /// The plan as one script an operator can paste into a SQL editor.
    pub fn to_sql(&self) -> String {
        self.statements()
            .into_iter()
            .map(|s| format!("{s};\n"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_policy_is_dropped_before_it_is_created() {
        let statements = REGISTRATIONS_SCHEMA.statements();

        for policy in REGISTRATIONS_SCHEMA.policies {
            let drop = statements
                .iter()
                .position(|s| s.starts_with("DROP POLICY") && s.contains(policy.name))
                .expect("drop statement");
            let create = statements
                .iter()
                .position(|s| s.starts_with("CREATE POLICY") && s.contains(policy.name))
                .expect("create statement");
            assert!(drop < create, "{} created before drop", policy.name);
        }
    }

    #[test]
    fn script_is_non_destructive() {
        let sql = REGISTRATIONS_SCHEMA.to_sql();

        assert!(sql.contains("CREATE TABLE IF NOT EXISTS event_registrations"));
        assert!(sql.contains("CREATE INDEX IF NOT EXISTS idx_registrations_email"));
        assert!(sql.contains("CREATE INDEX IF NOT EXISTS idx_registrations_created_at"));
        assert!(sql.contains("ENABLE ROW LEVEL SECURITY"));
        assert!(!sql.contains("DROP TABLE"));
        assert!(!sql.contains("TRUNCATE"));
    }

    #[test]
    fn optional_columns_default_to_empty_string() {
        for name in [
            "college_name",
            "department",
            "year_semester",
            "event_selection",
            "additional_notes",
        ] {
            let column = REGISTRATIONS_SCHEMA
                .columns
                .iter()
                .find(|c| c.name == name)
                .expect("column present");
            assert!(column.definition.ends_with("DEFAULT ''"), "{name}");
            assert!(!column.definition.contains("NOT NULL"), "{name}");
        }
    }
}
