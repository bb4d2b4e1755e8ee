use super::schema::{self, AliasSource, Columns, MachineAlias};
use crate::Result;
use rusqlite::{named_params, params, Connection, OptionalExtension};

pub fn insert(
    alias: &str,
    machine_id: i64,
    source: AliasSource,
    confidence: f64,
    conn: &Connection,
) -> Result<MachineAlias> {
    let sql = format!(
        r#"
            INSERT INTO {table} ({alias}, {machine_id}, {source}, {confidence})
            VALUES (:alias, :machine_id, :source, :confidence)
            RETURNING {projection}
        "#,
        table = schema::TABLE_NAME,
        alias = Columns::Alias.as_str(),
        machine_id = Columns::MachineId.as_str(),
        source = Columns::Source.as_str(),
        confidence = Columns::Confidence.as_str(),
        projection = MachineAlias::projection(),
    );
    let params = named_params! {
        ":alias": alias.trim(),
        ":machine_id": machine_id,
        ":source": source.as_ref(),
        ":confidence": confidence.clamp(0.0, 1.0),
    };
    conn.query_row(&sql, params, MachineAlias::mapper())
        .map_err(Into::into)
}

/// Case-insensitive, the alias column is declared with `COLLATE NOCASE`.
pub fn select_by_alias(alias: &str, conn: &Connection) -> Result<Option<MachineAlias>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {alias} = ?1
        "#,
        projection = MachineAlias::projection(),
        table = schema::TABLE_NAME,
        alias = Columns::Alias.as_str(),
    );
    conn.query_row(&sql, params![alias.trim()], MachineAlias::mapper())
        .optional()
        .map_err(Into::into)
}

pub fn select_by_machine_id(machine_id: i64, conn: &Connection) -> Result<Vec<MachineAlias>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {machine_id} = ?1
            ORDER BY {alias}
        "#,
        projection = MachineAlias::projection(),
        table = schema::TABLE_NAME,
        machine_id = Columns::MachineId.as_str(),
        alias = Columns::Alias.as_str(),
    );
    conn.prepare(&sql)?
        .query_map(params![machine_id], MachineAlias::mapper())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

#[cfg(test)]
mod test {
    use super::AliasSource;
    use crate::{db, db::test::conn, Result};

    #[test]
    fn insert() -> Result<()> {
        let conn = conn();
        let machine = db::machine::blocking_queries::insert("University", "", None, None, &conn)?;
        let alias = super::insert("Universty", machine.id, AliasSource::Fuzzy, 0.91, &conn)?;
        assert_eq!("Universty", alias.alias);
        assert_eq!(machine.id, alias.machine_id);
        assert_eq!(AliasSource::Fuzzy, alias.source);
        assert_eq!(0.91, alias.confidence);
        Ok(())
    }

    #[test]
    fn insert_requires_machine() -> Result<()> {
        let conn = conn();
        assert!(super::insert("Ghost", 42, AliasSource::Manual, 1.0, &conn).is_err());
        Ok(())
    }

    #[test]
    fn select_by_alias() -> Result<()> {
        let conn = conn();
        let machine = db::machine::blocking_queries::insert("University", "", None, None, &conn)?;
        let alias = super::insert("Uni", machine.id, AliasSource::Manual, 1.0, &conn)?;
        assert_eq!(Some(alias), super::select_by_alias("UNI", &conn)?);
        assert_eq!(None, super::select_by_alias("Campus", &conn)?);
        Ok(())
    }

    #[test]
    fn select_by_machine_id() -> Result<()> {
        let conn = conn();
        let machine = db::machine::blocking_queries::insert("University", "", None, None, &conn)?;
        let other = db::machine::blocking_queries::insert("Mall", "", None, None, &conn)?;
        let b = super::insert("Uni B", machine.id, AliasSource::Manual, 1.0, &conn)?;
        let a = super::insert("Uni A", machine.id, AliasSource::Manual, 1.0, &conn)?;
        super::insert("Mal", other.id, AliasSource::Manual, 1.0, &conn)?;
        assert_eq!(vec![a, b], super::select_by_machine_id(machine.id, &conn)?);
        Ok(())
    }
}
