//! Domain to wire conversions.

use blog_core::domain::{
    Category, Comment, CommentRecord, Location, Post, PostDraft, PostRecord, User, UserSummary,
};
use blog_core::listing::Page;
use blog_core::service::PostChoices;
use blog_shared::dto::{
    AuthorResponse, CategoryResponse, CommentResponse, LocationResponse, PageResponse,
    PostChoicesResponse, PostRequest, PostResponse, ProfileResponse, UserResponse,
};

pub fn author(summary: UserSummary) -> AuthorResponse {
    AuthorResponse {
        id: summary.id,
        username: summary.username,
    }
}

pub fn category(category: Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        title: category.title,
        description: category.description,
        slug: category.slug,
    }
}

pub fn location(location: Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        name: location.name,
    }
}

pub fn post(record: PostRecord) -> PostResponse {
    let PostRecord {
        post,
        author: summary,
        category: cat,
        location: loc,
        comment_count,
    } = record;

    PostResponse {
        id: post.id,
        title: post.title,
        text: post.text,
        pub_date: post.pub_date,
        image: post.image,
        is_published: post.is_published,
        author: author(summary),
        category: cat.map(category),
        location: loc.map(location),
        comment_count,
        created_at: post.created_at,
    }
}

pub fn comment(record: CommentRecord) -> CommentResponse {
    comment_by(record.comment, record.author)
}

pub fn comment_by(comment: Comment, summary: UserSummary) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        author: author(summary),
        text: comment.text,
        created_at: comment.created_at,
    }
}

pub fn page<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> PageResponse<U> {
    let has_next = page.has_next();
    let has_previous = page.has_previous();
    let page = page.map(f);

    PageResponse {
        items: page.items,
        number: page.number,
        page_size: page.page_size,
        total_items: page.total_items,
        total_pages: page.total_pages,
        has_next,
        has_previous,
    }
}

pub fn choices(choices: PostChoices) -> PostChoicesResponse {
    PostChoicesResponse {
        categories: choices.categories.into_iter().map(category).collect(),
        locations: choices.locations.into_iter().map(location).collect(),
    }
}

pub fn draft(request: PostRequest) -> PostDraft {
    PostDraft {
        title: request.title,
        text: request.text,
        pub_date: request.pub_date,
        image: request.image.filter(|path| !path.trim().is_empty()),
        location_id: request.location_id,
        category_id: request.category_id,
        is_published: request.is_published,
    }
}

/// Current values of a post, in the shape of its edit form.
pub fn post_form(post: Post) -> PostRequest {
    PostRequest {
        title: post.title,
        text: post.text,
        pub_date: post.pub_date,
        image: post.image,
        location_id: post.location_id,
        category_id: post.category_id,
        is_published: post.is_published,
    }
}

pub fn account(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        created_at: user.created_at,
    }
}

pub fn profile(user: User) -> ProfileResponse {
    ProfileResponse {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        date_joined: user.created_at,
    }
}
