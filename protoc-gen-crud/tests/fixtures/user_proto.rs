//! Types prost-build and tonic-build emit for the `user.proto` fixture

pub mod user {
    use crud_runtime::prost_types::Timestamp;
    use crud_runtime::proto::SearchRequest;

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct User {
        #[prost(string, tag = "1")]
        pub id: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub name: ::prost::alloc::string::String,
        #[prost(string, tag = "3")]
        pub email: ::prost::alloc::string::String,
        #[prost(string, optional, tag = "4")]
        pub phone: ::core::option::Option<::prost::alloc::string::String>,
        #[prost(enumeration = "UserStatus", tag = "5")]
        pub status: i32,
        #[prost(int32, tag = "6")]
        pub age: i32,
        #[prost(message, optional, tag = "7")]
        pub created_at: ::core::option::Option<Timestamp>,
        #[prost(message, optional, tag = "8")]
        pub updated_at: ::core::option::Option<Timestamp>,
        #[prost(string, tag = "9")]
        pub created_by: ::prost::alloc::string::String,
        #[prost(string, tag = "10")]
        pub updated_by: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CreateUserRequest {
        #[prost(string, tag = "1")]
        pub name: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub email: ::prost::alloc::string::String,
        #[prost(string, optional, tag = "3")]
        pub phone: ::core::option::Option<::prost::alloc::string::String>,
        #[prost(enumeration = "UserStatus", tag = "4")]
        pub status: i32,
        #[prost(int32, tag = "5")]
        pub age: i32,
        #[prost(string, tag = "6")]
        pub created_by: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CreateUserResponse {
        #[prost(message, optional, tag = "1")]
        pub user: ::core::option::Option<User>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetUserRequest {
        #[prost(string, tag = "1")]
        pub id: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetUserResponse {
        #[prost(message, optional, tag = "1")]
        pub user: ::core::option::Option<User>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GetUserByEmailRequest {
        #[prost(string, tag = "1")]
        pub email: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct UpdateUserRequest {
        #[prost(string, tag = "1")]
        pub id: ::prost::alloc::string::String,
        #[prost(string, optional, tag = "2")]
        pub name: ::core::option::Option<::prost::alloc::string::String>,
        #[prost(string, optional, tag = "3")]
        pub email: ::core::option::Option<::prost::alloc::string::String>,
        #[prost(string, optional, tag = "4")]
        pub phone: ::core::option::Option<::prost::alloc::string::String>,
        #[prost(enumeration = "UserStatus", tag = "5")]
        pub status: i32,
        #[prost(int32, optional, tag = "6")]
        pub age: ::core::option::Option<i32>,
        #[prost(string, tag = "7")]
        pub updated_by: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct UpdateUserResponse {
        #[prost(message, optional, tag = "1")]
        pub user: ::core::option::Option<User>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DeleteUserRequest {
        #[prost(string, tag = "1")]
        pub id: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DeleteUserResponse {
        #[prost(bool, tag = "1")]
        pub success: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ListUsersRequest {
        #[prost(message, optional, tag = "1")]
        pub search: ::core::option::Option<SearchRequest>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ListUsersResponse {
        #[prost(message, repeated, tag = "1")]
        pub users: ::prost::alloc::vec::Vec<User>,
        #[prost(int64, tag = "2")]
        pub total: i64,
        #[prost(int32, tag = "3")]
        pub page: i32,
        #[prost(int32, tag = "4")]
        pub page_size: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Tag {
        #[prost(string, tag = "1")]
        pub id: ::prost::alloc::string::String,
        #[prost(string, repeated, tag = "2")]
        pub aliases: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CreateTagRequest {
        #[prost(string, tag = "1")]
        pub name: ::prost::alloc::string::String,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum UserStatus {
        Active = 0,
        Inactive = 1,
        Suspended = 2,
    }

    pub mod user_service_server {
        use crud_runtime::tonic;

        #[tonic::async_trait]
        pub trait UserService: std::marker::Send + std::marker::Sync + 'static {
            async fn create_user(
                &self,
                request: tonic::Request<super::CreateUserRequest>,
            ) -> std::result::Result<tonic::Response<super::CreateUserResponse>, tonic::Status>;
            async fn get_user(
                &self,
                request: tonic::Request<super::GetUserRequest>,
            ) -> std::result::Result<tonic::Response<super::GetUserResponse>, tonic::Status>;
            async fn get_user_by_email(
                &self,
                request: tonic::Request<super::GetUserByEmailRequest>,
            ) -> std::result::Result<tonic::Response<super::GetUserResponse>, tonic::Status>;
            async fn update_user(
                &self,
                request: tonic::Request<super::UpdateUserRequest>,
            ) -> std::result::Result<tonic::Response<super::UpdateUserResponse>, tonic::Status>;
            async fn delete_user(
                &self,
                request: tonic::Request<super::DeleteUserRequest>,
            ) -> std::result::Result<tonic::Response<super::DeleteUserResponse>, tonic::Status>;
            async fn list_users(
                &self,
                request: tonic::Request<super::ListUsersRequest>,
            ) -> std::result::Result<tonic::Response<super::ListUsersResponse>, tonic::Status>;
        }
    }

    pub mod tag_service_server {
        use crud_runtime::tonic;

        #[tonic::async_trait]
        pub trait TagService: std::marker::Send + std::marker::Sync + 'static {
            async fn create_tag(
                &self,
                request: tonic::Request<super::CreateTagRequest>,
            ) -> std::result::Result<tonic::Response<super::Tag>, tonic::Status>;
        }
    }
}
