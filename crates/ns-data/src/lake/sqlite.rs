//! SQLite-backed data lake

use std::path::Path;
use std::sync::Arc;
use arrow::array::{
    ArrayRef,
    BinaryBuilder,
    Float64Builder,
    Int64Builder,
    StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parking_lot::Mutex;
use rusqlite::{params, types::Value, Connection};
use tracing::{debug, info, warn};

use ns_core::{Category, DatasetError, Kind, Result};
use super::{unsupported, LakeClient, LakeConnector};

const CREATE_ROOTFS: &str = "
    CREATE TABLE IF NOT EXISTS rootfs (
        parent TEXT NOT NULL,
        name TEXT NOT NULL,
        data BLOB,
        PRIMARY KEY (parent, name)
    )";

/// A lake stored in a single SQLite database
pub struct SqliteLake {
    conn: Mutex<Connection>,
}

impl SqliteLake {
    /// Open an existing lake database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatasetError::DatasetNotFound(path.display().to_string()));
        }

        let conn = Connection::open(path).map_err(DatasetError::transport)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a lake database, creating it and its table if needed
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(DatasetError::transport)?;
        conn.execute(CREATE_ROOTFS, []).map_err(DatasetError::transport)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// A private, empty in-memory lake
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatasetError::transport)?;
        conn.execute(CREATE_ROOTFS, []).map_err(DatasetError::transport)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Store one file under `parent`, replacing any previous version
    pub fn insert(&self, parent: &str, name: &str, data: &[u8]) -> Result<()> {
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO rootfs (parent, name, data) VALUES (?1, ?2, ?3)",
                params![parent, name, data],
            )
            .map_err(DatasetError::transport)?;
        Ok(())
    }

    /// Mirror the channel directories of a local dataset tree.
    /// Returns the number of files stored.
    pub fn import_dir<P: AsRef<Path>>(&self, root: P) -> Result<usize> {
        let root = root.as_ref();
        let mut count = 0;

        for category in Category::ALL {
            for kind in Kind::ALL {
                let dir = root.join(category.as_str()).join(kind.as_str());
                if !dir.is_dir() {
                    continue;
                }
                let parent = format!("/{}/{}", category, kind);

                for entry in std::fs::read_dir(&dir)? {
                    let entry = entry?;
                    if !entry.file_type()?.is_file() {
                        continue;
                    }
                    let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                        warn!("Skipping non UTF-8 file name in {}", dir.display());
                        continue;
                    };
                    let data = std::fs::read(entry.path())?;
                    self.insert(&parent, &name, &data)?;
                    count += 1;
                }
            }
        }

        info!("Imported {} files from {} into the lake", count, root.display());
        Ok(count)
    }
}

impl LakeClient for SqliteLake {
    fn sql(&self, query: &str) -> Result<RecordBatch> {
        debug!("Lake query: {}", query.split_whitespace().collect::<Vec<_>>().join(" "));
        let conn = self.conn.lock();
        query_batch(&conn, query)
    }
}

/// Connects `sqlite://<path>` URLs to [`SqliteLake`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteLakeConnector;

impl LakeConnector for SqliteLakeConnector {
    fn connect(&self, url: &str) -> Result<Arc<dyn LakeClient>> {
        let path = url.strip_prefix("sqlite://").ok_or_else(|| unsupported(url))?;
        Ok(Arc::new(SqliteLake::open(path)?))
    }
}

/// Run a query and build a record batch, inferring each column's type from
/// its first non-null value
fn query_batch(conn: &Connection, query: &str) -> Result<RecordBatch> {
    let mut stmt = conn.prepare(query).map_err(DatasetError::transport)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    let mut rows = stmt.query([]).map_err(DatasetError::transport)?;
    while let Some(row) = rows.next().map_err(DatasetError::transport)? {
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let value: Value = row.get(col_idx).map_err(DatasetError::transport)?;
            column.push(value);
        }
    }

    let mut fields = Vec::with_capacity(names.len());
    let mut arrays = Vec::with_capacity(names.len());
    for (name, values) in names.iter().zip(columns) {
        let data_type = infer_type(&values);
        fields.push(Field::new(name, data_type.clone(), true));
        arrays.push(build_array(&data_type, values));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(DatasetError::transport)
}

fn infer_type(values: &[Value]) -> DataType {
    values
        .iter()
        .find_map(|value| match value {
            Value::Integer(_) => Some(DataType::Int64),
            Value::Real(_) => Some(DataType::Float64),
            Value::Text(_) => Some(DataType::Utf8),
            Value::Blob(_) => Some(DataType::Binary),
            Value::Null => None,
        })
        .unwrap_or(DataType::Utf8)
}

fn build_array(data_type: &DataType, values: Vec<Value>) -> ArrayRef {
    match data_type {
        DataType::Int64 => {
            let mut builder = Int64Builder::new();
            for value in values {
                match value {
                    Value::Integer(i) => builder.append_value(i),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::new();
            for value in values {
                match value {
                    Value::Real(f) => builder.append_value(f),
                    Value::Integer(i) => builder.append_value(i as f64),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Binary => {
            let mut builder = BinaryBuilder::new();
            for value in values {
                match value {
                    Value::Blob(bytes) => builder.append_value(bytes),
                    Value::Text(text) => builder.append_value(text.as_bytes()),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        _ => {
            let mut builder = StringBuilder::new();
            for value in values {
                match value {
                    Value::Text(text) => builder.append_value(text),
                    Value::Integer(i) => builder.append_value(i.to_string()),
                    Value::Real(f) => builder.append_value(f.to_string()),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
    }
}
