use crate::common::models::{Story, UserSnapshot};

/// One author's active stories, in the order the feed returned them
#[derive(Debug, Clone, PartialEq)]
pub struct StoryGroup<'a> {
    pub author: &'a UserSnapshot,
    pub stories: Vec<&'a Story>,
}

/// Groups stories by author, ordering groups by each author's first story
pub fn group_by_author(stories: &[Story]) -> Vec<StoryGroup<'_>> {
    let mut groups: Vec<StoryGroup<'_>> = Vec::new();
    for story in stories {
        match groups.iter_mut().find(|g| g.author.id == story.user.id) {
            Some(group) => group.stories.push(story),
            None => groups.push(StoryGroup {
                author: &story.user,
                stories: vec![story],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn story(id: &str, author: &str) -> Story {
        serde_json::from_value(json!({
            "id": id,
            "image_url": format!("https://cdn/{id}.jpg"),
            "visibility": "all",
            "user": {"id": author, "username": author}
        }))
        .unwrap()
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let stories = vec![story("s1", "bob"), story("s2", "amy"), story("s3", "bob")];
        let groups = group_by_author(&stories);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].author.username, "bob");
        let ids: Vec<_> = groups[0].stories.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s3"]);
        assert_eq!(groups[1].stories.len(), 1);
    }
}
