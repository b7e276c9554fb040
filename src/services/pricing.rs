//! 价格计算

use crate::models::Chapter;

/// 选中章节的总价
///
/// 目录中不存在的 id 按 0 计。
pub fn total_price(selected_ids: &[String], catalog: &[Chapter]) -> f64 {
    selected_ids
        .iter()
        .filter_map(|id| catalog.iter().find(|c| &c.id == id))
        .map(|c| c.price)
        .sum()
}

/// 本次选择是否全部免费
pub fn is_free(selected_ids: &[String], catalog: &[Chapter]) -> bool {
    total_price(selected_ids, catalog) == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaperType;

    fn chapter(id: &str, price: f64) -> Chapter {
        Chapter {
            id: id.to_string(),
            title: id.to_string(),
            standard: "10".to_string(),
            subject: "algebra".to_string(),
            paper_type: PaperType::Question,
            price,
            source_ref: String::new(),
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_total_price() {
        let catalog = vec![chapter("1", 0.0), chapter("2", 50.0), chapter("3", 30.0)];
        assert_eq!(total_price(&ids(&["1", "2", "3"]), &catalog), 80.0);
        assert_eq!(total_price(&ids(&["2", "404"]), &catalog), 50.0);
        assert_eq!(total_price(&[], &catalog), 0.0);
    }

    #[test]
    fn test_is_free() {
        let catalog = vec![chapter("1", 0.0), chapter("2", 50.0)];
        assert!(is_free(&ids(&["1"]), &catalog));
        assert!(is_free(&ids(&["1", "missing"]), &catalog));
        assert!(!is_free(&ids(&["1", "2"]), &catalog));
    }
}
