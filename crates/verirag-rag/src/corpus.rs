//! 本地语料库: 文本加载、分段与内存全文索引

use std::path::Path;

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::*;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, doc};
use walkdir::WalkDir;

use verirag_core::{Result, VeriRagError};
use verirag_tools::CorpusLookup;

/// 分页符, 存在时按页切分
const PAGE_BREAK: char = '\u{000C}';

#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub id: String,
    pub source: String,
    pub content: String,
}

impl Passage {
    pub fn new(id: impl Into<String>, source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub source: String,
    pub content: String,
    pub score: f32,
}

/// 把一篇文本切成段落: 有分页符按页切分, 否则按空行分段后合并到 `chunk_size` 以内
pub fn split_passages(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);

    if text.contains(PAGE_BREAK) {
        return text
            .split(PAGE_BREAK)
            .map(str::trim)
            .filter(|page| !page.is_empty())
            .map(String::from)
            .collect();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        for piece in split_long(paragraph, chunk_size) {
            if !current.is_empty() && current.chars().count() + piece.chars().count() + 2 > chunk_size {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(&piece);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// 超长段落按词切开
fn split_long(paragraph: &str, chunk_size: usize) -> Vec<String> {
    if paragraph.chars().count() <= chunk_size {
        return vec![paragraph.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in paragraph.split_whitespace() {
        if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > chunk_size {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// 递归加载目录下指定扩展名的文本文件; 文件本身不会被修改
pub fn load_passages(dir: &Path, extensions: &[String], chunk_size: usize) -> Result<Vec<Passage>> {
    if !dir.is_dir() {
        return Err(VeriRagError::Corpus(format!(
            "语料目录不存在: {}",
            dir.display()
        )));
    }

    let mut files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable corpus entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    let mut passages = Vec::new();
    for path in files {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let source = path
            .strip_prefix(dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .to_string();

        for (i, chunk) in split_passages(&text, chunk_size).into_iter().enumerate() {
            passages.push(Passage::new(format!("{}#{}", source, i), source.clone(), chunk));
        }
    }

    tracing::info!("Loaded {} passages from {}", passages.len(), dir.display());
    Ok(passages)
}

fn index_error(e: impl std::fmt::Display) -> VeriRagError {
    VeriRagError::Corpus(e.to_string())
}

/// 内存 BM25 全文索引, 构建后只读
pub struct CorpusIndex {
    index: Index,
    reader: IndexReader,
    id_field: Field,
    content_field: Field,
    source_field: Field,
    len: usize,
}

impl CorpusIndex {
    pub fn build(passages: Vec<Passage>) -> Result<Self> {
        let mut schema_builder = Schema::builder();

        let id_field = schema_builder.add_text_field("id", STRING | STORED);
        let content_field = schema_builder.add_text_field("content", TEXT | STORED);
        let source_field = schema_builder.add_text_field("source", STRING | STORED);

        let index = Index::create_in_ram(schema_builder.build());
        let mut writer: IndexWriter = index
            .writer_with_num_threads(1, 50_000_000)
            .map_err(index_error)?;

        let len = passages.len();
        for passage in passages {
            writer
                .add_document(doc!(
                    id_field => passage.id,
                    content_field => passage.content,
                    source_field => passage.source,
                ))
                .map_err(index_error)?;
        }
        writer.commit().map_err(index_error)?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(index_error)?;

        Ok(Self {
            index,
            reader,
            id_field,
            content_field,
            source_field,
            len,
        })
    }

    /// 从目录加载并建立索引
    pub fn from_dir(dir: &Path, extensions: &[String], chunk_size: usize) -> Result<Self> {
        Self::build(load_passages(dir, extensions, chunk_size)?)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let query_parser = QueryParser::for_index(&self.index, vec![self.content_field]);

        // 用户问题是自然语言, 语法错误的部分直接忽略
        let (query, errors) = query_parser.parse_query_lenient(query);
        if !errors.is_empty() {
            tracing::debug!("Ignored {} query syntax errors", errors.len());
        }

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit.max(1)))
            .map_err(index_error)?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let retrieved: TantivyDocument = searcher.doc(doc_address).map_err(index_error)?;
            let text = |field: Field| {
                retrieved
                    .get_first(field)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string()
            };

            hits.push(SearchHit {
                id: text(self.id_field),
                source: text(self.source_field),
                content: text(self.content_field),
                score,
            });
        }

        Ok(hits)
    }
}

impl CorpusLookup for CorpusIndex {
    fn lookup(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        Ok(self
            .search(query, limit)?
            .into_iter()
            .map(|hit| hit.content)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_page_breaks() {
        let text = "page one\u{000C}  \u{000C}page two";
        assert_eq!(split_passages(text, 5), vec!["page one", "page two"]);
    }

    #[test]
    fn test_split_groups_paragraphs() {
        let text = "aaa\n\nbbb\n\ncccccccccc";
        assert_eq!(split_passages(text, 8), vec!["aaa\n\nbbb", "cccccccccc"]);
    }

    #[test]
    fn test_split_long_paragraph_on_words() {
        let text = "one two three four";
        assert_eq!(split_passages(text, 9), vec!["one two", "three", "four"]);
    }

    #[test]
    fn test_split_empty_text() {
        assert!(split_passages("  \n\n ", 100).is_empty());
    }

    #[test]
    fn test_load_passages_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Seoul is the capital.").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b.MD"), "Busan\n\nJeju").unwrap();
        std::fs::write(dir.path().join("c.pdf"), "binary").unwrap();

        let passages =
            load_passages(dir.path(), &["txt".to_string(), "md".to_string()], 100).unwrap();

        assert_eq!(passages.len(), 2);
        assert_eq!(passages[1].content, "Busan\n\nJeju");
        assert_eq!(passages[0].id, "a.txt#0");
        assert!(passages.iter().all(|p| !p.source.ends_with(".pdf")));
        assert!(dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_load_missing_dir_is_error() {
        let err = load_passages(Path::new("/nonexistent/corpus"), &[], 10).unwrap_err();
        assert!(matches!(err, VeriRagError::Corpus(_)));
    }

    #[test]
    fn test_index_search_ranks_and_limits() {
        let index = CorpusIndex::build(vec![
            Passage::new("1", "a", "Seoul is the capital of South Korea."),
            Passage::new("2", "a", "Seoul Seoul Seoul, the big city Seoul."),
            Passage::new("3", "b", "Tokyo is the capital of Japan."),
        ])
        .unwrap();

        assert_eq!(index.len(), 3);
        let hits = index.search("Seoul", 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].content.contains("Seoul"));

        let all = index.search("capital", 10).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_search_tolerates_query_syntax() {
        let index = CorpusIndex::build(vec![Passage::new("1", "a", "Rust (language) facts")]).unwrap();
        let hits = index.search("What is Rust (the language)?", 5).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_empty_index_and_blank_query() {
        let empty = CorpusIndex::build(Vec::new()).unwrap();
        assert!(empty.is_empty());
        assert!(empty.search("anything", 3).unwrap().is_empty());

        let index = CorpusIndex::build(vec![Passage::new("1", "a", "text")]).unwrap();
        assert!(index.lookup("   ", 3).unwrap().is_empty());
    }
}
