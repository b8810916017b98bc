//! Источники строк для конвейера.
//!
//! [`RowSource`] выдаёт уже разбитые на поля строки. Токенизация (кавычки,
//! разделители записей) делегирована крейту `csv`; CSV-источники настроены как
//! `flexible` и без обработки заголовка, поэтому проходит каждая физическая
//! строка, а ширину проверяет декодер.
//!
//! Источники открываются лениво, в потоке производителя, прямо перед чтением
//! первой строки. Тогда же передаётся проверенный [`Config`], чтобы
//! токенизатор использовал заданный разделитель.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
};

use csv::StringRecord;
use tracing::debug;

use crate::{
    error::{Result, StreamError},
    options::Config,
};

/// Упорядоченная конечная последовательность строк.
pub trait RowSource: Send + 'static {
    /// Открывает ресурс. Вызывается один раз, до [`read_row`](Self::read_row).
    ///
    /// # Errors
    ///
    /// [`StreamError::SourceOpen`], если ресурс не удалось открыть.
    fn open(&mut self, config: &Config) -> Result<()>;

    /// Читает следующую строку в `row`; в конце данных возвращает `false`.
    ///
    /// # Errors
    ///
    /// Любая ошибка токенизатора или ввода/вывода.
    fn read_row(&mut self, row: &mut StringRecord) -> std::result::Result<bool, csv::Error>;
}

fn csv_reader<R: Read>(reader: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader)
}

/// CSV-файл на диске.
pub struct CsvFileSource {
    path: PathBuf,
    reader: Option<csv::Reader<File>>,
}

impl CsvFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), reader: None }
    }

    /// Путь к файлу.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSource for CsvFileSource {
    fn open(&mut self, config: &Config) -> Result<()> {
        let file = File::open(&self.path).map_err(|e| StreamError::SourceOpen {
            path: self.path.clone(),
            source: Arc::new(e),
        })?;
        debug!(path = %self.path.display(), "source opened");
        self.reader = Some(csv_reader(file, config.delimiter()));
        Ok(())
    }

    fn read_row(&mut self, row: &mut StringRecord) -> std::result::Result<bool, csv::Error> {
        match self.reader.as_mut() {
            Some(reader) => reader.read_record(row),
            None => Ok(false),
        }
    }
}

/// CSV-данные из любого reader'а (stdin, сокеты, буферы в памяти).
pub struct CsvReaderSource<R> {
    pending: Option<R>,
    reader: Option<csv::Reader<R>>,
}

impl<R: Read + Send + 'static> CsvReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { pending: Some(reader), reader: None }
    }
}

impl<R: Read + Send + 'static> RowSource for CsvReaderSource<R> {
    fn open(&mut self, config: &Config) -> Result<()> {
        if let Some(inner) = self.pending.take() {
            self.reader = Some(csv_reader(inner, config.delimiter()));
        }
        Ok(())
    }

    fn read_row(&mut self, row: &mut StringRecord) -> std::result::Result<bool, csv::Error> {
        match self.reader.as_mut() {
            Some(reader) => reader.read_record(row),
            None => Ok(false),
        }
    }
}

/// Заранее разбитые строки в памяти.
///
/// # Пример
///
/// ```
/// use csvstream::{Config, MemorySource, RowSource, StringRecord};
///
/// let mut source = MemorySource::new(vec![vec!["NAME", "AGE"], vec!["Sarah", "12"]]);
/// source.open(&Config::default()).unwrap();
///
/// let mut row = StringRecord::new();
/// assert!(source.read_row(&mut row).unwrap());
/// assert_eq!(&row[0], "NAME");
/// ```
pub struct MemorySource {
    rows: std::vec::IntoIter<Vec<String>>,
}

impl MemorySource {
    pub fn new<S: Into<String>>(rows: Vec<Vec<S>>) -> Self {
        let rows: Vec<Vec<String>> =
            rows.into_iter().map(|row| row.into_iter().map(Into::into).collect()).collect();
        Self { rows: rows.into_iter() }
    }
}

impl RowSource for MemorySource {
    fn open(&mut self, _config: &Config) -> Result<()> {
        Ok(())
    }

    fn read_row(&mut self, row: &mut StringRecord) -> std::result::Result<bool, csv::Error> {
        row.clear();
        match self.rows.next() {
            Some(fields) => {
                for field in &fields {
                    row.push_field(field);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::*;
    use crate::options::Options;

    fn drain(source: &mut impl RowSource) -> Vec<Vec<String>> {
        let mut row = StringRecord::new();
        let mut rows = Vec::new();
        while source.read_row(&mut row).unwrap() {
            rows.push(row.iter().map(str::to_string).collect());
        }
        rows
    }

    #[test]
    fn reader_source_keeps_fields_verbatim() {
        let data = "NAME,AGE\n Sarah ,12\n\"Doe, John\",21\n";
        let mut source = CsvReaderSource::new(Cursor::new(data));
        source.open(&Config::default()).unwrap();

        assert_eq!(
            drain(&mut source),
            vec![
                vec!["NAME".to_string(), "AGE".to_string()],
                vec![" Sarah ".to_string(), "12".to_string()],
                vec!["Doe, John".to_string(), "21".to_string()],
            ]
        );
    }

    #[test]
    fn reader_source_allows_ragged_rows() {
        let config = Options { delimiter: ';', ..Options::default() }.validate(3).unwrap();
        let mut source = CsvReaderSource::new(Cursor::new("a;b;c\nd\n"));
        source.open(&config).unwrap();

        let rows = drain(&mut source);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1].len(), 1);
    }

    #[test]
    fn file_source_opens_lazily() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x,y").unwrap();

        let mut source = CsvFileSource::new(file.path());
        let mut row = StringRecord::new();
        assert!(!source.read_row(&mut row).unwrap());

        source.open(&Config::default()).unwrap();
        assert_eq!(drain(&mut source), vec![vec!["x".to_string(), "y".to_string()]]);
    }

    #[test]
    fn missing_file_is_source_open_error() {
        let mut source = CsvFileSource::new("/definitely/not/here.csv");
        let err = source.open(&Config::default()).unwrap_err();
        assert!(matches!(err, StreamError::SourceOpen { .. }));
    }

    #[test]
    fn memory_source() {
        let mut source = MemorySource::new(vec![vec!["1", "2"], vec!["3"]]);
        source.open(&Config::default()).unwrap();
        assert_eq!(drain(&mut source).len(), 2);
    }
}
