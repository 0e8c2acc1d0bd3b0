use crate::strategy::ContentType;
use crate::text::escape_html;
use crate::types::Article;

/// Append a "Related Articles" block to every article linking to the others.
///
/// Returns the number of links added to each article; a single article gets
/// nothing.
pub fn add_related_articles(articles: &mut [Article]) -> usize {
    if articles.len() < 2 {
        return 0;
    }

    let links: Vec<String> = articles
        .iter()
        .map(|article| {
            let icon = ContentType::parse(&article.article_type)
                .unwrap_or(ContentType::GeneralDocumentation)
                .strategy()
                .icon;
            format!(
                "<li>{} <a href=\"/articles/{}\">{}</a></li>",
                icon,
                article.id,
                escape_html(&article.title)
            )
        })
        .collect();

    for (index, article) in articles.iter_mut().enumerate() {
        if article.content.contains("class=\"related-articles\"") {
            continue;
        }

        let mut block = String::from("<div class=\"related-articles\">\n<h3>Related Articles</h3>\n<ul>\n");
        for (other, link) in links.iter().enumerate() {
            if other != index {
                block.push_str(link);
                block.push('\n');
            }
        }
        block.push_str("</ul>\n</div>\n");

        article.content = match article.content.rfind("</div>") {
            Some(end) => format!("{}{}{}", &article.content[..end], block, &article.content[end..]),
            None => format!("{}\n{}", article.content, block),
        };
    }

    articles.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> Article {
        Article::new(
            title,
            "<div class=\"article-body\">\n<p>Body</p>\n</div>",
            "api_documentation",
            "api.md",
        )
    }

    #[test]
    fn test_single_article_untouched() {
        let mut articles = vec![article("Only")];
        assert_eq!(add_related_articles(&mut articles), 0);
        assert!(!articles[0].content.contains("Related Articles"));
    }

    #[test]
    fn test_links_to_the_others() {
        let mut articles = vec![article("One"), article("Two & Three"), article("Four")];
        let second_id = articles[1].id;

        assert_eq!(add_related_articles(&mut articles), 2);

        let first = &articles[0].content;
        assert!(first.contains(&format!(
            "<li>🔌 <a href=\"/articles/{}\">Two &amp; Three</a></li>",
            second_id
        )));
        assert!(!first.contains(&format!("/articles/{}\"", articles[0].id)));
        assert!(first.ends_with("</ul>\n</div>\n</div>"));

        let before = articles[2].content.clone();
        add_related_articles(&mut articles);
        assert_eq!(articles[2].content, before);
    }
}
