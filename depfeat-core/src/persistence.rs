//! # Persistência dos Dicionários
//!
//! Formato texto, orientado a linhas:
//!
//! ```text
//! <label> <ordinal>      (um por linha, ordinal = 0, 1, 2, ... na ordem de inserção)
//!                        (uma linha em branco)
//! <feature> <id>         (um por linha, em ordem de id)
//! ```
//!
//! Os ids gravados são lidos de volta exatamente como estão (não são reatribuídos):
//! o estado do classificador treinado é indexado por eles, então um ciclo
//! `save` → `load` precisa reproduzi-los bit a bit.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::dictionary::{is_storable_name, FeatureDictionary, LabelDictionary};
use crate::errors::{FeatureError, Result};

/// Grava labels e features em `path`.
///
/// A escrita passa por um arquivo temporário no mesmo diretório, renomeado só no final:
/// se algo falhar no meio, o arquivo anterior (se houver) continua intacto.
pub fn save<P>(features: &FeatureDictionary, labels: &LabelDictionary, path: P) -> Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write_to(features, labels, &mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| FeatureError::Io(e.error))?;

    debug!(
        path = %path.display(),
        labels = labels.size(),
        features = features.size(),
        "dicionário salvo"
    );
    Ok(())
}

/// Carrega labels e features de `path`.
pub fn load<P>(path: P) -> Result<(FeatureDictionary, LabelDictionary)>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let (features, labels) = read_from(reader)?;

    debug!(
        path = %path.display(),
        labels = labels.size(),
        features = features.size(),
        "dicionário carregado"
    );
    Ok((features, labels))
}

/// Serializa os dicionários em qualquer `Write`.
pub fn write_to<W>(features: &FeatureDictionary, labels: &LabelDictionary, writer: &mut W) -> Result<()>
where
    W: Write,
{
    let mut line = 1;
    for (ordinal, label) in labels.labels().iter().enumerate() {
        check_name(label, line)?;
        writeln!(writer, "{label} {ordinal}")?;
        line += 1;
    }
    writeln!(writer)?;
    line += 1;
    for (name, id) in features.iter() {
        check_name(name, line)?;
        writeln!(writer, "{name} {id}")?;
        line += 1;
    }
    Ok(())
}

/// Lê os dicionários de qualquer `BufRead`.
///
/// Falha sem devolver dicionário parcial se:
/// - uma linha não tiver exatamente dois campos separados por espaço;
/// - o id não for inteiro;
/// - o ordinal de um label não coincidir com sua posição;
/// - os ids de features não formarem o intervalo denso `0..n` sem repetição;
/// - a linha em branco separadora não existir.
pub fn read_from<R>(reader: R) -> Result<(FeatureDictionary, LabelDictionary)>
where
    R: BufRead,
{
    let mut features = FeatureDictionary::new();
    let mut labels = LabelDictionary::new();
    let mut past_labels = false;
    // (linha, id) de cada feature, para validar o espaço de ids no final
    let mut feature_ids = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = i + 1;
        if line.trim().is_empty() {
            past_labels = true;
            continue;
        }
        let (name, id) = parse_entry(&line, lineno)?;
        if past_labels {
            if features.insert_with_id(name, id).is_some() {
                return Err(FeatureError::invalid_format(
                    lineno,
                    format!("feature repetida: {name}"),
                ));
            }
            feature_ids.push((lineno, id));
        } else {
            if id != labels.size() {
                return Err(FeatureError::invalid_format(
                    lineno,
                    format!("ordinal {id} do label {name} deveria ser {}", labels.size()),
                ));
            }
            if labels.push_persisted(name, id).is_some() {
                return Err(FeatureError::invalid_format(
                    lineno,
                    format!("label repetido: {name}"),
                ));
            }
        }
    }

    if !past_labels {
        return Err(FeatureError::MissingSeparator);
    }

    let n = feature_ids.len();
    let mut seen = vec![false; n];
    for (lineno, id) in feature_ids {
        if id >= n || seen[id] {
            return Err(FeatureError::invalid_format(
                lineno,
                format!("id {id} repetido ou fora do intervalo 0..{n}"),
            ));
        }
        seen[id] = true;
    }

    Ok((features, labels))
}

fn parse_entry(line: &str, lineno: usize) -> Result<(&str, usize)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [name, id] = fields.as_slice() else {
        return Err(FeatureError::invalid_format(
            lineno,
            format!("esperados 2 campos, encontrados {}", fields.len()),
        ));
    };
    let id = id
        .parse::<usize>()
        .map_err(|e| FeatureError::invalid_format(lineno, format!("id inválido {id:?}: {e}")))?;
    Ok((*name, id))
}

fn check_name(name: &str, line: usize) -> Result<()> {
    if !is_storable_name(name) {
        return Err(FeatureError::invalid_format(
            line,
            format!("nome vazio ou com espaço não pode ser gravado: {name:?}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_str(s: &str) -> Result<(FeatureDictionary, LabelDictionary)> {
        read_from(Cursor::new(s.as_bytes()))
    }

    #[test]
    fn test_load_scenario() {
        let (features, labels) = read_str("A 0\nB 1\n\nfoo 0\nbar 1\n").unwrap();

        assert_eq!(labels.labels(), &["A".to_string(), "B".to_string()]);
        assert_eq!(labels.lookup("B"), Some(1));
        assert_eq!(features.lookup("foo"), Some(0));
        assert_eq!(features.lookup("bar"), Some(1));
        assert_eq!(features.size(), 2);
    }

    #[test]
    fn test_write_then_read_is_identical() {
        let (features, labels) = read_str("A 0\nB 1\n\nfoo 0\nbar 1\n").unwrap();

        let mut buf = Vec::new();
        write_to(&features, &labels, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf.clone()).unwrap(), "A 0\nB 1\n\nfoo 0\nbar 1\n");

        let (features2, labels2) = read_from(Cursor::new(buf)).unwrap();
        assert_eq!(features, features2);
        assert_eq!(labels, labels2);
    }

    #[test]
    fn test_grown_dictionary_round_trip() {
        let mut features = FeatureDictionary::new();
        let mut labels = LabelDictionary::new();
        for name in ["0:dog", "1:null", "w1w2:a_b", "0:dog", "t1:<comma>"] {
            features.lookup_or_insert(name);
        }
        for label in ["SHIFT", "REDUCE", "LEFT-det", "SHIFT"] {
            labels.label_id(label);
        }

        let mut buf = Vec::new();
        write_to(&features, &labels, &mut buf).unwrap();
        let (features2, labels2) = read_from(Cursor::new(buf)).unwrap();

        assert_eq!(features, features2);
        assert_eq!(labels, labels2);
        // continua crescendo a partir do mesmo ponto
        let mut features2 = features2;
        assert_eq!(features2.lookup_or_insert("novo"), 4);
    }

    #[test]
    fn test_empty_dictionaries() {
        let mut buf = Vec::new();
        write_to(&FeatureDictionary::new(), &LabelDictionary::new(), &mut buf).unwrap();
        assert_eq!(buf, b"\n");

        let (features, labels) = read_from(Cursor::new(buf)).unwrap();
        assert!(features.is_empty());
        assert!(labels.is_empty());
    }

    #[test]
    fn test_missing_separator() {
        let err = read_str("A 0\nB 1\n").unwrap_err();
        assert!(matches!(err, FeatureError::MissingSeparator));
    }

    #[test]
    fn test_wrong_field_count() {
        let err = read_str("A 0\n\nfoo bar 0\n").unwrap_err();
        assert!(matches!(err, FeatureError::InvalidFormat { line: 3, .. }));

        let err = read_str("A\n\n").unwrap_err();
        assert!(matches!(err, FeatureError::InvalidFormat { line: 1, .. }));
    }

    #[test]
    fn test_non_integer_id() {
        let err = read_str("A 0\n\nfoo x\n").unwrap_err();
        assert!(matches!(err, FeatureError::InvalidFormat { line: 3, .. }));
    }

    #[test]
    fn test_label_ordinal_must_match_position() {
        let err = read_str("A 1\n\n").unwrap_err();
        assert!(matches!(err, FeatureError::InvalidFormat { line: 1, .. }));
    }

    #[test]
    fn test_feature_ids_must_be_dense() {
        let err = read_str("\nfoo 0\nbar 5\n").unwrap_err();
        assert!(matches!(err, FeatureError::InvalidFormat { line: 3, .. }));

        let err = read_str("\nfoo 0\nbar 0\n").unwrap_err();
        assert!(matches!(err, FeatureError::InvalidFormat { .. }));
    }

    #[test]
    fn test_feature_order_in_file_is_insignificant() {
        let (features, _) = read_str("\nbar 1\nfoo 0\n").unwrap();
        assert_eq!(features.lookup("foo"), Some(0));
        assert_eq!(features.lookup("bar"), Some(1));
    }

    #[test]
    fn test_refuses_to_write_names_with_spaces() {
        let mut features = FeatureDictionary::new();
        features.lookup_or_insert("w1:new york");
        let err = write_to(&features, &LabelDictionary::new(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, FeatureError::InvalidFormat { line: 2, .. }));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.dict");

        let mut features = FeatureDictionary::new();
        let mut labels = LabelDictionary::new();
        features.lookup_or_insert("0:dog");
        features.lookup_or_insert("2:NN");
        labels.label_id("SHIFT");

        save(&features, &labels, &path).unwrap();
        let (features2, labels2) = load(&path).unwrap();

        assert_eq!(features, features2);
        assert_eq!(labels, labels2);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("nope.dict")).unwrap_err();
        assert!(matches!(err, FeatureError::Io(_)));
    }
}
