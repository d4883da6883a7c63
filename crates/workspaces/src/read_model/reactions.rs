use crate::types::ReactionGroup;

/// Fold `(emoji, member_id)` pairs into one group per emoji, keeping the
/// order in which each emoji and each member first appears.
pub fn group_reactions<'a, I>(reactions: I) -> Vec<ReactionGroup>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut groups: Vec<ReactionGroup> = Vec::new();

    for (emoji, member_id) in reactions {
        let group = match groups.iter().position(|g| g.emoji == emoji) {
            Some(index) => &mut groups[index],
            None => {
                groups.push(ReactionGroup {
                    emoji: emoji.to_string(),
                    count: 0,
                    member_ids: Vec::new(),
                });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };

        group.count += 1;
        if !group.member_ids.iter().any(|m| m == member_id) {
            group.member_ids.push(member_id.to_string());
        }
    }

    groups
}
